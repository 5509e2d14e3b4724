// src/pipeline/rotate.rs

//! One rotation run: discover, prune, select, then enrich, compose, publish
//! and record each pick, and finally persist.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::error::Result;
use crate::models::{Config, ItemId, RotationRecords};
use crate::services::{
    Composer, Enricher, ListingFetcher, PostId, Publisher, collect_candidates, enrich_or_keep,
    select,
};
use crate::storage::RotationStore;

/// External collaborators of a run.
pub struct Collaborators<'a> {
    pub fetcher: &'a dyn ListingFetcher,
    /// `None` disables enrichment
    pub enricher: Option<&'a dyn Enricher>,
    /// `None` is a dry run: messages are composed and logged, nothing is
    /// published and the rotation state is not saved
    pub publisher: Option<&'a dyn Publisher>,
    pub store: &'a dyn RotationStore,
}

/// Plain run parameters.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub pages: u32,
    pub sample_size: usize,
    pub retention: chrono::Duration,
    pub post_delay: Duration,
    pub page_delay: Duration,
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            pages: config.search.pages,
            sample_size: config.selection.sample_size,
            retention: config.selection.retention(),
            post_delay: Duration::from_secs(config.publisher.post_delay_secs),
            page_delay: Duration::from_millis(config.crawler.request_delay_ms),
        }
    }
}

/// What a run did.
#[derive(Debug, Default)]
pub struct RunReport {
    pub candidates: usize,
    pub pages_failed: u32,
    pub pruned: usize,
    pub pool_size: usize,
    pub fell_back: bool,
    pub posted: Vec<(ItemId, PostId)>,
    pub failed: Vec<ItemId>,
    /// Messages composed during a dry run
    pub previews: Vec<(ItemId, String)>,
    /// Whether the rotation state was written back
    pub saved: bool,
}

/// Execute one rotation run.
///
/// `now` is the reference time for pruning and for new rotation records.
/// Failures are logged and never end the run: a failed publish leaves the
/// item's record untouched, an unreadable state store means the run starts
/// from empty records and skips the final save, and a failed save is
/// reported with the ids that were posted.
pub async fn run_rotation<R: Rng + Send>(
    collaborators: &Collaborators<'_>,
    composer: &Composer,
    options: &RunOptions,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<RunReport> {
    let mut report = RunReport::default();

    // Discover
    let aggregation =
        collect_candidates(collaborators.fetcher, options.pages, options.page_delay).await;
    report.candidates = aggregation.candidates.len();
    report.pages_failed = aggregation.pages_failed;
    log::info!(
        "Found {} candidates on {} pages ({} failed)",
        report.candidates,
        aggregation.pages_fetched,
        aggregation.pages_failed
    );

    // Prune
    let (mut records, loaded) = match collaborators.store.load().await {
        Ok(records) => (records, true),
        Err(e) => {
            log::error!(
                "Failed to load rotation state ({}); continuing without it and not saving",
                e
            );
            (RotationRecords::new(), false)
        }
    };
    report.pruned = records.prune(options.retention, now);
    log::debug!(
        "Pruned {} rotation records, {} still live",
        report.pruned,
        records.len()
    );

    // Select
    let selection = select(&aggregation.candidates, &records, options.sample_size, rng);
    report.pool_size = selection.pool_size;
    report.fell_back = selection.fell_back;
    if selection.fell_back {
        log::info!("Every candidate was posted recently; drawing from all of them");
    }
    if selection.picks.is_empty() {
        log::info!("No candidates to post");
    }

    for (index, pick) in selection.picks.iter().enumerate() {
        // Enrich
        let candidate = match collaborators.enricher {
            Some(enricher) => enrich_or_keep(enricher, pick).await,
            None => pick.clone(),
        };

        // Compose
        let text = composer.compose(&candidate, rng);

        let Some(publisher) = collaborators.publisher else {
            log::info!("[dry run] item {}:\n{}", candidate.id, text);
            report.previews.push((candidate.id, text));
            continue;
        };

        if index > 0 && !options.post_delay.is_zero() {
            tokio::time::sleep(options.post_delay).await;
        }

        // Publish, then record
        match publisher.publish(&text).await {
            Ok(post_id) => {
                log::info!("Post OK: id={} | {}", post_id, candidate.url);
                records.record(candidate.id, now);
                report.posted.push((candidate.id, post_id));
            }
            Err(error) => {
                log::error!("Post NG: {} | {}", candidate.url, error);
                report.failed.push(candidate.id);
            }
        }
    }

    // Persist
    if collaborators.publisher.is_some() && loaded {
        match collaborators.store.save(&records).await {
            Ok(()) => report.saved = true,
            Err(e) => {
                let posted: Vec<ItemId> = report.posted.iter().map(|(id, _)| *id).collect();
                log::error!(
                    "Failed to save rotation state ({}); posted ids not recorded: {:?}",
                    e,
                    posted
                );
            }
        }
    }

    log::info!(
        "done. posted={} failed={}",
        report.posted.len(),
        report.failed.len()
    );
    Ok(report)
}
