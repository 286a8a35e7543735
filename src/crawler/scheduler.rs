//! Scheduler for managing the crawl frontier and request pacing
//!
//! This module handles:
//! - FIFO queue of listing pages still to be processed
//! - Fixed delays before detail fetches and after listing pages
//! - Interrupting those delays when the run is cancelled

use std::collections::VecDeque;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A listing page queued for processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Absolute URL of the listing page
    pub url: Url,

    /// 1-based position of the page in the pagination chain
    pub page_index: u32,
}

/// Queue of listing pages
///
/// Pages are processed in the order they were discovered. The crawl only
/// ever follows one "next page" link per page, so the queue rarely holds
/// more than one entry.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    enqueued: u32,
}

impl Frontier {
    /// Creates a frontier seeded with one page
    pub fn seeded(url: Url) -> Self {
        let mut frontier = Self::default();
        frontier.push(url);
        frontier
    }

    /// Appends a page and assigns it the next page index
    pub fn push(&mut self, url: Url) {
        self.enqueued += 1;
        self.queue.push_back(FrontierEntry {
            url,
            page_index: self.enqueued,
        });
    }

    /// Takes the oldest queued page
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    /// Gets the number of queued pages
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Checks if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Fixed delays between requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    /// Wait before each detail page fetch
    pub request_delay: Duration,

    /// Wait after each listing page
    pub page_delay: Duration,
}

impl Pacer {
    /// Creates a pacer from millisecond delays
    pub fn from_millis(request_delay: u64, page_delay: u64) -> Self {
        Self {
            request_delay: Duration::from_millis(request_delay),
            page_delay: Duration::from_millis(page_delay),
        }
    }

    /// Pacer that never waits
    pub fn immediate() -> Self {
        Self::from_millis(0, 0)
    }

    /// Waits before a detail fetch
    ///
    /// # Returns
    ///
    /// `false` if the run was cancelled before or during the wait
    pub async fn before_detail(&self, cancel: &CancellationToken) -> bool {
        pause(self.request_delay, cancel).await
    }

    /// Waits after a listing page
    ///
    /// # Returns
    ///
    /// `false` if the run was cancelled before or during the wait
    pub async fn after_page(&self, cancel: &CancellationToken) -> bool {
        pause(self.page_delay, cancel).await
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::from_millis(1000, 1000)
    }
}

/// Sleeps for `delay` unless cancelled first
async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if delay.is_zero() {
        return true;
    }

    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
