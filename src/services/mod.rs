//! Service layer for the rotator.
//!
//! This module contains the business logic for:
//! - Search page scraping (`SearchPageFetcher`)
//! - Candidate aggregation (`collect_candidates`)
//! - Detail page enrichment (`DetailPageEnricher`)
//! - Repeat-avoiding selection (`select`)
//! - Message composition (`Composer`)
//! - Publishing (`XPublisher`)

mod aggregate;
mod composer;
mod enrich;
mod listings;
pub mod oauth;
mod publisher;
mod selection;

pub use aggregate::{Aggregation, collect_candidates};
pub use composer::{Composer, Draft, char_len, truncate};
pub use enrich::{DetailPageEnricher, Enricher, enrich_or_keep};
pub use listings::{ListingFetcher, ListingParser, SearchPageFetcher};
pub use publisher::{PostId, Publisher, XPublisher, interpret_response};
pub use selection::{Selection, select};
