//! Rotator CLI
//!
//! Meant to be triggered periodically (cron, CI schedule). Runs must not
//! overlap: the rotation state has no locking.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rotator::{
    error::{AppError, Result},
    models::{Candidate, Config, Credentials},
    pipeline::{Collaborators, RunOptions, run_rotation},
    services::{
        Composer, DetailPageEnricher, Enricher, Publisher, SearchPageFetcher, XPublisher, char_len,
    },
    storage::{LocalRotationStore, RotationStore},
    utils::http,
};

/// Rotator - random storefront listings, posted without near-term repeats
#[derive(Parser, Debug)]
#[command(name = "rotator", version, about = "Posts random listings to X")]
struct Cli {
    /// Path to storage directory containing config.toml and the rotation state
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover, select and post listings
    Run {
        /// Compose messages without posting or saving state
        #[arg(long)]
        dry_run: bool,

        /// Seed for the random source (default: current time)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Validate configuration and credentials
    Validate,

    /// Show rotation records
    State {
        /// Drop expired records and save the result
        #[arg(long)]
        prune: bool,
    },

    /// Compose messages for a hand-made listing
    Preview {
        #[arg(long)]
        title: String,

        #[arg(long)]
        url: String,

        #[arg(long)]
        price: Option<String>,

        #[arg(long)]
        shop: Option<String>,

        /// Number of variants to print
        #[arg(short = 'n', long, default_value_t = 3)]
        count: usize,

        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Seed derived from the wall clock, so consecutive runs draw differently.
fn time_seed() -> u64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .map(|n| n as u64)
        .unwrap_or_else(|| now.timestamp() as u64)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    let store = LocalRotationStore::new(cli.storage_dir.join(&config.storage.state_file));

    match cli.command {
        Command::Run { dry_run, seed } => {
            config.validate()?;

            // Credentials are checked before any network activity
            let credentials = if dry_run {
                None
            } else {
                Some(Credentials::from_env()?)
            };

            let client = http::create_client(&config.crawler)?;
            let fetcher = SearchPageFetcher::new(client.clone(), &config.search)?;
            let enricher = if config.enrichment.enabled {
                Some(DetailPageEnricher::new(
                    client.clone(),
                    &config.enrichment,
                    &config.search,
                )?)
            } else {
                None
            };
            let publisher = credentials
                .map(|creds| XPublisher::new(client, &config.publisher, creds))
                .transpose()?;
            let composer = Composer::new(config.composer.clone())?;

            let collaborators = Collaborators {
                fetcher: &fetcher,
                enricher: enricher.as_ref().map(|e| e as &dyn Enricher),
                publisher: publisher.as_ref().map(|p| p as &dyn Publisher),
                store: &store,
            };

            let seed = seed.unwrap_or_else(time_seed);
            log::debug!("Random seed: {}", seed);
            let mut rng = StdRng::seed_from_u64(seed);

            let report = run_rotation(
                &collaborators,
                &composer,
                &RunOptions::from_config(&config),
                &mut rng,
                Utc::now(),
            )
            .await?;

            if !report.failed.is_empty() {
                log::warn!("{} post(s) failed: {:?}", report.failed.len(), report.failed);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            let missing = Credentials::missing(&|name: &str| std::env::var(name).ok());
            if !missing.is_empty() {
                let message = format!("missing credentials: {}", missing.join(", "));
                log::error!("{}", message);
                return Err(AppError::config(message));
            }
            log::info!("✓ Credentials present");

            log::info!("All validations passed!");
        }

        Command::State { prune } => {
            let mut records = store.load().await?;
            let now = Utc::now();
            let retention = config.selection.retention();

            log::info!("State file: {}", store.path().display());
            log::info!("{} rotation records", records.len());
            for (id, posted_at) in records.iter() {
                let age_hours = (now.timestamp() - posted_at) / 3600;
                let status = if now.timestamp() - posted_at < retention.num_seconds() {
                    "live"
                } else {
                    "expired"
                };
                log::info!("  {:>12}  {:>5}h ago  {}", id, age_hours, status);
            }

            if prune {
                let removed = records.prune(retention, now);
                store.save(&records).await?;
                log::info!("Pruned {} records, {} remain", removed, records.len());
            }
        }

        Command::Preview {
            title,
            url,
            price,
            shop,
            count,
            seed,
        } => {
            let composer = Composer::new(config.composer.clone())?;
            let candidate = Candidate {
                id: 0,
                title,
                url,
                price,
                shop,
            };
            let mut rng = StdRng::seed_from_u64(seed.unwrap_or_else(time_seed));

            for i in 1..=count {
                let text = composer.compose(&candidate, &mut rng);
                println!("--- variant {} ({} chars) ---\n{}\n", i, char_len(&text), text);
            }
        }
    }

    Ok(())
}
