//! Crawler module for catalog page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Page fetching behind the `PageFetcher` seam
//! - Per-run duplicate detection and the author quality filter
//! - Frontier management and request pacing
//! - Overall crawl coordination and progress reporting

mod coordinator;
mod dedup;
mod fetcher;
mod progress;
mod quality;
mod scheduler;

pub use coordinator::{Coordinator, CrawlOutcome, CrawlSettings};
pub use dedup::DuplicateDetector;
pub use fetcher::{build_http_client, decode_page, FetchError, HttpFetcher, PageFetcher};
pub use progress::{ProgressCallback, ProgressEvent, ProgressReporter, RejectReason};
pub use quality::is_acceptable;
pub use scheduler::{Frontier, FrontierEntry, Pacer};

use crate::config::Config;
use crate::ShelfError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation over HTTP
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client from the user agent configuration
/// 2. Walk the listing pages starting at `seed_url`
/// 3. Enrich, deduplicate and filter every listed item
/// 4. Return the accepted items with the run statistics
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `seed_url` - First listing page
/// * `cancel` - Stops the run early when cancelled
/// * `progress` - Optional receiver of progress messages
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - The run reached a terminal state
/// * `Err(ShelfError)` - The run could not be started
pub async fn crawl(
    config: &Config,
    seed_url: &str,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
) -> Result<CrawlOutcome, ShelfError> {
    let fetcher = HttpFetcher::new(&config.user_agent)?;

    let mut coordinator = Coordinator::new(
        Arc::new(fetcher),
        CrawlSettings::from_config(&config.crawler),
    )
    .with_cancellation(cancel);

    if let Some(callback) = progress {
        coordinator = coordinator.with_progress(callback);
    }

    coordinator
        .run_crawl(seed_url, config.crawler.max_pages)
        .await
}
