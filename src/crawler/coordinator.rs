//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates one run:
//! - Walking listing pages in pagination order
//! - Deduplicating and enriching every candidate item
//! - Filtering out items without usable authors or titles
//! - Handling listing failures, cancellation and progress reporting
//!
//! A run is strictly sequential. One listing page and all of its detail pages
//! are handled before the next listing page is fetched.

use crate::catalog::Item;
use crate::config::{CrawlerConfig, ListingFailurePolicy};
use crate::crawler::dedup::DuplicateDetector;
use crate::crawler::fetcher::{decode_page, PageFetcher};
use crate::crawler::progress::{ProgressCallback, ProgressEvent, ProgressReporter, RejectReason};
use crate::crawler::quality::is_acceptable;
use crate::crawler::scheduler::{Frontier, FrontierEntry, Pacer};
use crate::extract::{enrich, extract_next_page_link, listing_candidates};
use crate::state::{CrawlStats, RunState};
use crate::ShelfError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Tunables for a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrawlSettings {
    /// Delays before detail fetches and after listing pages
    pub pacer: Pacer,

    /// Reaction to a listing page that cannot be fetched
    pub listing_failure: ListingFailurePolicy,
}

impl CrawlSettings {
    /// Builds settings from the crawler section of the configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            pacer: Pacer::from_millis(config.request_delay, config.page_delay),
            listing_failure: config.listing_failure,
        }
    }
}

/// Everything a finished run produced
///
/// Returned for every terminal state; an aborted or cancelled run still
/// carries the items accepted before it stopped.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Accepted items in discovery order
    pub items: Vec<Item>,

    /// Final counters
    pub stats: CrawlStats,

    /// Terminal state of the run
    pub state: RunState,
}

/// State owned by a single run
#[derive(Debug)]
struct RunContext {
    frontier: Frontier,
    detector: DuplicateDetector,
    stats: CrawlStats,
    accepted: Vec<Item>,
}

impl RunContext {
    fn new(seed: Url) -> Self {
        Self {
            frontier: Frontier::seeded(seed),
            detector: DuplicateDetector::new(),
            stats: CrawlStats::new(),
            accepted: Vec::new(),
        }
    }
}

/// Main crawler coordinator structure
///
/// A coordinator runs exactly one crawl. It starts `Idle`, becomes `Running`
/// in [`Coordinator::run_crawl`] and ends in a terminal state.
pub struct Coordinator {
    fetcher: Arc<dyn PageFetcher>,
    settings: CrawlSettings,
    progress: ProgressReporter,
    cancel: CancellationToken,
    state: RunState,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Transport used for listing and detail pages
    /// * `settings` - Pacing and failure policy
    pub fn new(fetcher: Arc<dyn PageFetcher>, settings: CrawlSettings) -> Self {
        Self {
            fetcher,
            settings,
            progress: ProgressReporter::silent(),
            cancel: CancellationToken::new(),
            state: RunState::Idle,
        }
    }

    /// Attaches a progress callback
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = ProgressReporter::new(callback);
        self
    }

    /// Uses `token` to stop the run early
    ///
    /// The token is checked at every page start and before every detail
    /// fetch, and interrupts the delays in between.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Gets the current run state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Crawls from `seed_url`, processing at most `max_pages` listing pages
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - The run reached a terminal state
    /// * `Err(ShelfError)` - The run could not start (bad arguments, or this
    ///   coordinator was already used)
    pub async fn run_crawl(
        &mut self,
        seed_url: &str,
        max_pages: u32,
    ) -> Result<CrawlOutcome, ShelfError> {
        if !self.state.can_transition_to(RunState::Running) {
            return Err(ShelfError::InvalidTransition {
                from: self.state,
                to: RunState::Running,
            });
        }

        if max_pages == 0 {
            return Err(ShelfError::InvalidArgument(
                "max pages must be at least 1".to_string(),
            ));
        }

        let seed = Url::parse(seed_url)?;
        if seed.scheme() != "http" && seed.scheme() != "https" {
            return Err(ShelfError::InvalidArgument(format!(
                "seed URL must use HTTP or HTTPS: {}",
                seed_url
            )));
        }

        self.transition(RunState::Running)?;
        tracing::info!("Starting crawl of {} (max {} pages)", seed, max_pages);
        self.progress.emit(&ProgressEvent::Started {
            seed_url,
            max_pages,
        });

        let mut run = RunContext::new(seed);
        let final_state = self.crawl_pages(&mut run, max_pages).await;
        self.transition(final_state)?;

        tracing::info!(
            "Crawl {}: {} pages, {} found, {} added, {} duplicates, {} rejected",
            final_state,
            run.stats.pages_processed,
            run.stats.total_found,
            run.stats.unique_added,
            run.stats.duplicates_rejected,
            run.stats.missing_author_rejected + run.stats.missing_title_rejected
        );
        self.progress.emit(&ProgressEvent::Finished {
            state: final_state,
            stats: &run.stats,
        });

        Ok(CrawlOutcome {
            items: run.accepted,
            stats: run.stats,
            state: final_state,
        })
    }

    fn transition(&mut self, next: RunState) -> Result<(), ShelfError> {
        if !self.state.can_transition_to(next) {
            return Err(ShelfError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::debug!("Run state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// The crawl loop; returns the terminal state to enter
    async fn crawl_pages(&self, run: &mut RunContext, max_pages: u32) -> RunState {
        let pacer = self.settings.pacer;

        while run.stats.pages_processed < u64::from(max_pages) {
            if self.cancel.is_cancelled() {
                return self.cancelled();
            }

            let Some(entry) = run.frontier.pop() else {
                break;
            };
            run.stats.pages_processed += 1;

            tracing::info!("Listing page {}/{}: {}", entry.page_index, max_pages, entry.url);
            self.progress.emit(&ProgressEvent::PageStarted {
                index: entry.page_index,
                max_pages,
                url: entry.url.as_str(),
            });

            let fetched = self.fetcher.fetch(entry.url.as_str()).await;
            let html = match fetched {
                Ok(bytes) => decode_page(&bytes),
                Err(e) => {
                    run.stats.listing_fetch_failures += 1;
                    let aborting = self.settings.listing_failure == ListingFailurePolicy::Abort;
                    self.progress.emit(&ProgressEvent::ListingFailed {
                        url: entry.url.as_str(),
                        error: e.to_string(),
                        aborting,
                    });

                    if aborting {
                        tracing::error!("Listing page failed, aborting run: {}", e);
                        return RunState::Aborted;
                    }

                    tracing::warn!("Listing page failed, skipping: {}", e);
                    if !pacer.after_page(&self.cancel).await {
                        return self.cancelled();
                    }
                    continue;
                }
            };

            if !self.process_candidates(run, &entry, &html).await {
                return self.cancelled();
            }

            if run.stats.pages_processed < u64::from(max_pages) {
                self.queue_next_page(run, &entry, &html);
            }

            if !pacer.after_page(&self.cancel).await {
                return self.cancelled();
            }
        }

        RunState::Completed
    }

    /// Handles every candidate of one listing page
    ///
    /// Returns `false` if the run was cancelled part way through.
    async fn process_candidates(
        &self,
        run: &mut RunContext,
        entry: &FrontierEntry,
        html: &str,
    ) -> bool {
        let candidates = listing_candidates(html, &entry.url);
        run.stats.total_found += candidates.len() as u64;

        tracing::debug!("Found {} candidates on {}", candidates.len(), entry.url);
        self.progress.emit(&ProgressEvent::CandidatesFound {
            count: candidates.len(),
        });

        for candidate in candidates {
            if run.detector.is_duplicate(&candidate.url) {
                run.stats.duplicates_rejected += 1;
                tracing::debug!("Duplicate skipped: {}", candidate.url);
                self.progress
                    .emit(&ProgressEvent::DuplicateSkipped { url: &candidate.url });
                continue;
            }

            if !self.settings.pacer.before_detail(&self.cancel).await {
                return false;
            }

            let item = self.enrich_candidate(candidate, &mut run.stats).await;

            let reason = if !is_acceptable(&item) {
                run.stats.missing_author_rejected += 1;
                Some(RejectReason::MissingAuthor)
            } else if !item.has_title() {
                run.stats.missing_title_rejected += 1;
                Some(RejectReason::MissingTitle)
            } else {
                None
            };

            let label = item_label(&item);
            if let Some(reason) = reason {
                tracing::debug!("Rejected ({}): {}", reason, item.url);
                self.progress.emit(&ProgressEvent::Rejected { label, reason });
                continue;
            }

            tracing::debug!("Accepted: {}", item.url);
            self.progress.emit(&ProgressEvent::Accepted { label });
            run.stats.unique_added += 1;
            run.accepted.push(item);
        }

        true
    }

    /// Fetches the detail page of a candidate and merges it in
    ///
    /// A failed fetch leaves the candidate exactly as the listing gave it.
    async fn enrich_candidate(&self, candidate: Item, stats: &mut CrawlStats) -> Item {
        let fetched = self.fetcher.fetch(&candidate.url).await;

        match fetched {
            Ok(bytes) => enrich(candidate, &decode_page(&bytes)),
            Err(e) => {
                stats.detail_fetch_failures += 1;
                tracing::warn!("Detail page failed, keeping listing data: {}", e);
                self.progress.emit(&ProgressEvent::DetailFailed {
                    url: &candidate.url,
                    error: e.to_string(),
                });
                candidate
            }
        }
    }

    /// Queues the page's "next" link unless it points back at the page
    fn queue_next_page(&self, run: &mut RunContext, entry: &FrontierEntry, html: &str) {
        let Some(next) = extract_next_page_link(html, &entry.url) else {
            tracing::debug!("No next page link on {}", entry.url);
            return;
        };

        if next.eq_ignore_ascii_case(entry.url.as_str()) {
            tracing::debug!("Next page link of {} points to itself", entry.url);
            return;
        }

        match Url::parse(&next) {
            Ok(next_url) => {
                self.progress
                    .emit(&ProgressEvent::NextPageQueued { url: &next });
                run.frontier.push(next_url);
            }
            Err(e) => tracing::debug!("Ignoring next page link '{}': {}", next, e),
        }
    }

    fn cancelled(&self) -> RunState {
        tracing::warn!("Crawl cancelled");
        RunState::Cancelled
    }
}

/// Title for progress messages, falling back to the URL
fn item_label(item: &Item) -> &str {
    if item.has_title() {
        &item.title
    } else {
        &item.url
    }
}
