//! Statistics display
//!
//! This module loads run statistics from the storage layer and prints them.

use crate::state::{CrawlStats, RunState};
use crate::storage::{RunRecord, Storage, StorageError};
use crate::ShelfError;

/// Loads the most recent run from storage
///
/// # Returns
///
/// * `Ok(RunRecord)` - The latest run with its statistics
/// * `Err(ShelfError)` - No runs yet, or the query failed
pub fn load_statistics(storage: &dyn Storage) -> Result<RunRecord, ShelfError> {
    storage
        .get_latest_run()?
        .ok_or_else(|| ShelfError::Storage(StorageError::NoRuns))
}

/// Formats run statistics as aligned text
pub fn format_statistics(state: RunState, stats: &CrawlStats) -> String {
    let labels = stats.labels();
    let width = labels.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

    let mut out = String::from("=== Crawl Statistics ===\n\n");
    out.push_str(&format!("  {:<width$}  {}\n", "State", state, width = width));
    for (label, value) in labels {
        out.push_str(&format!("  {:<width$}  {}\n", label, value, width = width));
    }

    let acceptance = if stats.total_found > 0 {
        (stats.unique_added as f64 / stats.total_found as f64) * 100.0
    } else {
        0.0
    };
    out.push_str(&format!(
        "\nAcceptance Rate: {:.1}% ({} / {} candidates added)\n",
        acceptance, stats.unique_added, stats.total_found
    ));

    out
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `state` - Terminal state of the run
/// * `stats` - The statistics to display
pub fn print_statistics(state: RunState, stats: &CrawlStats) {
    print!("{}", format_statistics(state, stats));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_statistics() {
        let stats = CrawlStats {
            pages_processed: 2,
            total_found: 40,
            unique_added: 30,
            duplicates_rejected: 4,
            ..CrawlStats::default()
        };

        let text = format_statistics(RunState::Completed, &stats);

        assert!(text.starts_with("=== Crawl Statistics ==="));
        assert!(text.contains("completed"));
        assert!(text.contains("Pages processed"));
        assert!(text.contains("Acceptance Rate: 75.0% (30 / 40 candidates added)"));
    }

    #[test]
    fn test_format_statistics_empty_run() {
        let text = format_statistics(RunState::Aborted, &CrawlStats::new());
        assert!(text.contains("Acceptance Rate: 0.0%"));
    }
}
