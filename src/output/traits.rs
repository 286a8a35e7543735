//! Report types and errors
//!
//! This module defines the data handed to report renderers and the errors
//! they can raise.

use crate::catalog::Item;
use crate::state::{CrawlStats, RunState};
use crate::storage::{AnalysisResult, RunRecord};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Everything a report renders for one run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// When the report was generated
    pub generated_at: DateTime<Utc>,

    /// First listing page of the run
    pub seed_url: String,

    /// Page budget of the run
    pub max_pages: u32,

    /// Terminal state of the run
    pub state: RunState,

    /// Ordered statistic label/value pairs
    pub stats: Vec<(&'static str, String)>,

    /// Catalog analyses
    pub analyses: Vec<AnalysisResult>,

    /// Items listed at the end of the report
    pub items: Vec<Item>,
}

impl RunReport {
    /// Creates a report with no analyses and no items
    pub fn new(
        seed_url: impl Into<String>,
        max_pages: u32,
        state: RunState,
        stats: &CrawlStats,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            seed_url: seed_url.into(),
            max_pages,
            state,
            stats: stats.labels(),
            analyses: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Creates a report for a persisted run
    pub fn from_run(run: &RunRecord) -> Self {
        Self::new(run.seed_url.clone(), run.max_pages, run.state, &run.stats)
    }

    /// Sets the analyses section
    pub fn with_analyses(mut self, analyses: Vec<AnalysisResult>) -> Self {
        self.analyses = analyses;
        self
    }

    /// Sets the items section
    pub fn with_items(mut self, items: Vec<Item>) -> Self {
        self.items = items;
        self
    }
}
