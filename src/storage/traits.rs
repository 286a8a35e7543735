//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::catalog::Item;
use crate::state::{CrawlStats, RunState};
use crate::storage::{AnalysisResult, RunRecord};
use rust_decimal::Decimal;
use thiserror::Error;

/// Price cap used by the standard "cheaper than" analysis
pub const DEFAULT_PRICE_CAP: i64 = 50;

/// Year used by the standard "published after" analyses
pub const DEFAULT_YEAR: i32 = 2020;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("No crawl runs found in database")]
    NoRuns,

    #[error("Run {run_id} is already finished ({state})")]
    RunAlreadyFinished { run_id: i64, state: RunState },

    #[error("Invalid value in column {column}: {value}")]
    InvalidValue { column: &'static str, value: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Persistence sink for finished crawl runs plus the read side used by
/// reports: recent items and the catalog analyses.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run in the `running` state
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `seed_url` - First listing page of the run
    /// * `max_pages` - Page budget of the run
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, seed_url: &str, max_pages: u32)
        -> StorageResult<i64>;

    /// Records the terminal state and final counters of a run
    fn finish_run(&mut self, run_id: i64, state: RunState, stats: &CrawlStats)
        -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Item Management =====

    /// Saves accepted items in one transaction
    ///
    /// Items are upserted by URL; an existing item takes the new field
    /// values and its author list is replaced.
    ///
    /// # Returns
    ///
    /// The number of items written
    fn save_items(&mut self, run_id: i64, items: &[Item]) -> StorageResult<usize>;

    /// Gets the total number of stored items
    fn count_items(&self) -> StorageResult<u64>;

    /// Loads up to `limit` items, most recently seen runs first
    fn load_recent_items(&self, limit: u32) -> StorageResult<Vec<Item>>;

    // ===== Analyses =====

    /// Priced items, most expensive first
    fn most_expensive(&self, limit: u32) -> StorageResult<AnalysisResult>;

    /// Priced items, cheapest first
    fn cheapest(&self, limit: u32) -> StorageResult<AnalysisResult>;

    /// Items strictly cheaper than `max_price`, cheapest first
    fn cheaper_than(&self, max_price: Decimal, limit: u32) -> StorageResult<AnalysisResult>;

    /// Items published after `year`, newest first
    fn published_after(&self, year: i32, limit: u32) -> StorageResult<AnalysisResult>;

    /// Authors by the average price of their priced items, highest first
    fn authors_by_average_price(&self, limit: u32) -> StorageResult<AnalysisResult>;

    /// Publishers by number of items
    fn top_publishers(&self, limit: u32) -> StorageResult<AnalysisResult>;

    /// Authors by number of items
    fn top_authors(&self, limit: u32) -> StorageResult<AnalysisResult>;

    /// Authors by number of items published after `year`
    fn authors_published_after(&self, year: i32, limit: u32) -> StorageResult<AnalysisResult>;

    /// Runs the standard set of analyses for reports
    ///
    /// Uses a price cap of 50 and the year 2020 for the parameterized ones.
    fn run_standard_analyses(&self, limit: u32) -> StorageResult<Vec<AnalysisResult>> {
        Ok(vec![
            self.most_expensive(limit)?,
            self.cheapest(limit)?,
            self.cheaper_than(Decimal::from(DEFAULT_PRICE_CAP), limit)?,
            self.published_after(DEFAULT_YEAR, limit)?,
            self.authors_by_average_price(limit)?,
            self.top_publishers(limit)?,
            self.top_authors(limit)?,
            self.authors_published_after(DEFAULT_YEAR, limit)?,
        ])
    }
}
