//! Per-run URL deduplication

use std::collections::HashSet;

/// Remembers every candidate URL seen during one crawl run
///
/// URLs are compared byte for byte; no normalization happens here. The
/// detector is owned by the run that created it and is not shared.
#[derive(Debug, Default)]
pub struct DuplicateDetector {
    seen: HashSet<String>,
    rejected: u64,
}

impl DuplicateDetector {
    /// Creates an empty detector
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `url` was seen before; otherwise records it
    ///
    /// # Example
    ///
    /// ```
    /// use shelf_crawler::crawler::DuplicateDetector;
    ///
    /// let mut detector = DuplicateDetector::new();
    /// assert!(!detector.is_duplicate("https://shop.test/a-p-1.html"));
    /// assert!(detector.is_duplicate("https://shop.test/a-p-1.html"));
    /// ```
    pub fn is_duplicate(&mut self, url: &str) -> bool {
        if self.seen.contains(url) {
            self.rejected += 1;
            true
        } else {
            self.seen.insert(url.to_string());
            false
        }
    }

    /// Number of distinct URLs seen
    pub fn unique_count(&self) -> usize {
        self.seen.len()
    }

    /// Number of calls that reported a duplicate
    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }
}
