//! Output module for generating run reports
//!
//! This module handles:
//! - Assembling report data from a run and the stored catalog
//! - Rendering markdown reports
//! - Printing run statistics

mod markdown;
pub mod stats;
mod traits;

pub use markdown::{format_markdown_report, generate_markdown_report};
pub use stats::{format_statistics, load_statistics, print_statistics};
pub use traits::{OutputError, OutputResult, RunReport};

use crate::catalog::Item;
use crate::storage::{RunRecord, Storage};
use crate::ShelfError;

/// Builds a report for a run from storage
///
/// # Arguments
///
/// * `storage` - The storage backend containing the catalog
/// * `run` - The run the report is about
/// * `items` - Items to list; the most recent stored items when `None`
/// * `limit` - Rows per analysis, and item count when loading from storage
///
/// # Returns
///
/// * `Ok(RunReport)` - Report ready for rendering
/// * `Err(ShelfError)` - A storage query failed
pub fn build_report(
    storage: &dyn Storage,
    run: &RunRecord,
    items: Option<Vec<Item>>,
    limit: u32,
) -> Result<RunReport, ShelfError> {
    let analyses = storage.run_standard_analyses(limit)?;

    let items = match items {
        Some(items) => items,
        None => storage.load_recent_items(limit)?,
    };

    Ok(RunReport::from_run(run)
        .with_analyses(analyses)
        .with_items(items))
}
