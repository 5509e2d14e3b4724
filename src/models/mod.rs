// src/models/mod.rs

//! Domain models for the rotator.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod candidate;
mod config;
mod credentials;
mod rotation;

// Re-export all public types
pub use candidate::{Candidate, Enrichment, ItemId};
pub use config::{
    ComposerConfig, Config, CrawlerConfig, EnrichmentConfig, PublisherConfig, SearchConfig,
    SelectionConfig, StorageConfig, parse_selector,
};
pub use credentials::Credentials;
pub use rotation::{RawRecords, RotationRecords};
