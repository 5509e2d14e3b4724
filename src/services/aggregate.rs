// src/services/aggregate.rs

//! Candidate aggregation across search pages.

use std::collections::HashMap;
use std::time::Duration;

use crate::models::{Candidate, ItemId};
use crate::services::ListingFetcher;

/// Merged result of scanning several search pages.
#[derive(Debug, Default)]
pub struct Aggregation {
    pub candidates: Vec<Candidate>,
    pub pages_fetched: u32,
    pub pages_failed: u32,
}

/// Fetch pages `1..=pages` one after another and merge them by id.
///
/// A failing page is logged and skipped. For duplicate ids the last
/// listing seen wins, while the position of the first one is kept.
pub async fn collect_candidates(
    fetcher: &dyn ListingFetcher,
    pages: u32,
    page_delay: Duration,
) -> Aggregation {
    let mut aggregation = Aggregation::default();
    let mut positions: HashMap<ItemId, usize> = HashMap::new();

    for page in 1..=pages {
        if page > 1 && !page_delay.is_zero() {
            tokio::time::sleep(page_delay).await;
        }

        let listings = match fetcher.fetch_page(page).await {
            Ok(listings) => listings,
            Err(error) => {
                aggregation.pages_failed += 1;
                log::warn!("page {} fetch failed: {}", page, error);
                continue;
            }
        };

        aggregation.pages_fetched += 1;
        log::debug!("page {}: {} listings", page, listings.len());

        for listing in listings {
            match positions.get(&listing.id) {
                Some(&pos) => aggregation.candidates[pos] = listing,
                None => {
                    positions.insert(listing.id, aggregation.candidates.len());
                    aggregation.candidates.push(listing);
                }
            }
        }
    }

    aggregation
}
