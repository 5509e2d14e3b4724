// src/lib.rs

//! Rotator Library
//!
//! Picks random storefront listings, skipping the ones posted recently,
//! and publishes a short promotional message for each.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
