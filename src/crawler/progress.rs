//! Progress reporting for a running crawl
//!
//! Progress messages are plain strings handed to a caller-supplied callback.
//! A callback that panics is logged and otherwise ignored; it never changes
//! the outcome of the crawl.

use crate::state::{CrawlStats, RunState};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Callback receiving human-readable progress messages
pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Why an enriched item was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingAuthor,
    MissingTitle,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAuthor => write!(f, "no usable author"),
            Self::MissingTitle => write!(f, "no title"),
        }
    }
}

/// Something worth telling the user about during a crawl
#[derive(Debug)]
pub enum ProgressEvent<'a> {
    Started {
        seed_url: &'a str,
        max_pages: u32,
    },
    PageStarted {
        index: u32,
        max_pages: u32,
        url: &'a str,
    },
    CandidatesFound {
        count: usize,
    },
    DuplicateSkipped {
        url: &'a str,
    },
    DetailFailed {
        url: &'a str,
        error: String,
    },
    Rejected {
        label: &'a str,
        reason: RejectReason,
    },
    Accepted {
        label: &'a str,
    },
    ListingFailed {
        url: &'a str,
        error: String,
        aborting: bool,
    },
    NextPageQueued {
        url: &'a str,
    },
    Finished {
        state: RunState,
        stats: &'a CrawlStats,
    },
}

impl fmt::Display for ProgressEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started {
                seed_url,
                max_pages,
            } => write!(f, "Starting crawl of {} (up to {} pages)", seed_url, max_pages),
            Self::PageStarted {
                index,
                max_pages,
                url,
            } => write!(f, "Page {}/{}: {}", index, max_pages, url),
            Self::CandidatesFound { count } => write!(f, "Found {} items on page", count),
            Self::DuplicateSkipped { url } => write!(f, "Duplicate skipped: {}", url),
            Self::DetailFailed { url, error } => {
                write!(f, "Could not fetch details for {}: {}", url, error)
            }
            Self::Rejected { label, reason } => write!(f, "Rejected ({}): {}", reason, label),
            Self::Accepted { label } => write!(f, "Added: {}", label),
            Self::ListingFailed {
                url,
                error,
                aborting,
            } => {
                if *aborting {
                    write!(f, "Listing page {} failed ({}), stopping", url, error)
                } else {
                    write!(f, "Listing page {} failed ({}), skipping", url, error)
                }
            }
            Self::NextPageQueued { url } => write!(f, "Next page: {}", url),
            Self::Finished { state, stats } => write!(
                f,
                "Crawl {}: {} pages, {} found, {} added, {} rejected",
                state,
                stats.pages_processed,
                stats.total_found,
                stats.unique_added,
                stats.total_rejected()
            ),
        }
    }
}

/// Delivers progress events to an optional callback
#[derive(Clone, Default)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
}

impl ProgressReporter {
    /// Creates a reporter that forwards to `callback`
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    /// Creates a reporter that drops every event
    pub fn silent() -> Self {
        Self::default()
    }

    /// Formats and delivers one event
    pub fn emit(&self, event: &ProgressEvent<'_>) {
        let Some(callback) = &self.callback else {
            return;
        };

        let message = event.to_string();
        if catch_unwind(AssertUnwindSafe(|| callback(&message))).is_err() {
            tracing::warn!("Progress callback panicked on message: {}", message);
        }
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
