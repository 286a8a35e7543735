//! Run statistics
//!
//! Counters owned by the coordinator for the duration of one run. They only
//! ever grow; a new run starts from [`CrawlStats::default`].

/// Counters accumulated during a crawl run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Listing pages dequeued (including ones that failed to fetch)
    pub pages_processed: u64,

    /// Candidates seen on listing pages
    pub total_found: u64,

    /// Items accepted into the result
    pub unique_added: u64,

    /// Candidates skipped because their URL was already seen this run
    pub duplicates_rejected: u64,

    /// Items rejected by the author quality filter
    pub missing_author_rejected: u64,

    /// Items rejected because no title could be found
    pub missing_title_rejected: u64,

    /// Detail pages that failed to fetch (item kept with listing data)
    pub detail_fetch_failures: u64,

    /// Listing pages that failed to fetch
    pub listing_fetch_failures: u64,
}

impl CrawlStats {
    /// Creates zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of candidates rejected for any reason
    pub fn total_rejected(&self) -> u64 {
        self.duplicates_rejected + self.missing_author_rejected + self.missing_title_rejected
    }

    /// Ordered label/value pairs for reports
    pub fn labels(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Pages processed", self.pages_processed.to_string()),
            ("Candidates found", self.total_found.to_string()),
            ("Items added", self.unique_added.to_string()),
            ("Duplicates rejected", self.duplicates_rejected.to_string()),
            (
                "Rejected (missing author)",
                self.missing_author_rejected.to_string(),
            ),
            (
                "Rejected (missing title)",
                self.missing_title_rejected.to_string(),
            ),
            (
                "Detail fetch failures",
                self.detail_fetch_failures.to_string(),
            ),
            (
                "Listing fetch failures",
                self.listing_fetch_failures.to_string(),
            ),
        ]
    }
}
