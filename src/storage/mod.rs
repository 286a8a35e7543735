//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Run tracking with final statistics
//! - Item persistence keyed by URL
//! - Catalog analyses for reports

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult, DEFAULT_PRICE_CAP, DEFAULT_YEAR};

use crate::catalog::Item;
use crate::crawler::CrawlOutcome;
use crate::state::{CrawlStats, RunState};
use crate::ShelfError;
use rust_decimal::Decimal;

/// Persists a finished crawl: its items, then its final state and counters
///
/// The run is finished even when saving the items fails, so its row never
/// stays `running` and the counters are kept. The save error is returned
/// afterwards.
///
/// # Arguments
///
/// * `storage` - The storage backend
/// * `run_id` - Run created before the crawl started
/// * `outcome` - What the crawl produced
///
/// # Returns
///
/// * `Ok(usize)` - Number of items written
/// * `Err(ShelfError)` - Saving the items or finishing the run failed
pub fn record_outcome(
    storage: &mut dyn Storage,
    run_id: i64,
    outcome: &CrawlOutcome,
) -> Result<usize, ShelfError> {
    let saved = storage.save_items(run_id, &outcome.items);
    if let Err(e) = &saved {
        tracing::error!(
            "Failed to save {} items of run {}: {}",
            outcome.items.len(),
            run_id,
            e
        );
    }

    storage.finish_run(run_id, outcome.state, &outcome.stats)?;
    Ok(saved?)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub seed_url: String,
    pub max_pages: u32,
    pub state: RunState,
    pub stats: CrawlStats,
}

/// One named analysis over the stored catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    /// Analysis title
    pub name: String,

    /// Formatted result rows, best first
    pub lines: Vec<String>,

    /// Description of the analysis parameter, if it has one
    pub parameter: Option<String>,
}

impl AnalysisResult {
    /// Creates a result without a parameter
    pub fn new(name: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            name: name.into(),
            lines,
            parameter: None,
        }
    }

    /// Attaches a parameter description
    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }
}

/// Formats a price for analysis lines and reports
///
/// # Example
///
/// ```
/// use rust_decimal::Decimal;
/// use shelf_crawler::storage::format_price;
///
/// assert_eq!(format_price(Decimal::new(3999, 2)), "39.99 PLN");
/// assert_eq!(format_price(Decimal::from(50)), "50.00 PLN");
/// ```
pub fn format_price(price: Decimal) -> String {
    format!("{:.2} PLN", price)
}

/// Formats an item row: `Title - Author1, Author2 (value)`
///
/// The author part is left out when the item has no authors.
pub fn item_line(item: &Item, value: &str) -> String {
    match item.authors_display() {
        Some(authors) => format!("{} - {} ({})", item.title, authors, value),
        None => format!("{} ({})", item.title, value),
    }
}

/// Formats a counted row: `Name (N books)`
pub fn count_line(name: &str, count: u64) -> String {
    if count == 1 {
        format!("{} (1 book)", name)
    } else {
        format!("{} ({} books)", name, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_line_with_authors() {
        let item = Item {
            title: "Wiedźmin".to_string(),
            authors: vec!["Andrzej Sapkowski".to_string()],
            ..Item::default()
        };
        assert_eq!(
            item_line(&item, "39.99 PLN"),
            "Wiedźmin - Andrzej Sapkowski (39.99 PLN)"
        );
    }

    #[test]
    fn test_item_line_without_authors() {
        let item = Item {
            title: "Atlas".to_string(),
            ..Item::default()
        };
        assert_eq!(item_line(&item, "2021"), "Atlas (2021)");
    }

    #[test]
    fn test_count_line() {
        assert_eq!(count_line("Znak", 1), "Znak (1 book)");
        assert_eq!(count_line("Znak", 3), "Znak (3 books)");
    }

    #[test]
    fn test_format_price_rounds_to_cents() {
        assert_eq!(format_price(Decimal::new(125, 1)), "12.50 PLN");
    }

    #[test]
    fn test_analysis_result_parameter() {
        let result = AnalysisResult::new("Cheaper than", vec![]).with_parameter("price below 50.00 PLN");
        assert_eq!(result.parameter.as_deref(), Some("price below 50.00 PLN"));
    }

    fn outcome(items: Vec<Item>) -> CrawlOutcome {
        let stats = CrawlStats {
            pages_processed: 1,
            total_found: items.len() as u64,
            unique_added: items.len() as u64,
            ..CrawlStats::default()
        };
        CrawlOutcome {
            items,
            stats,
            state: RunState::Completed,
        }
    }

    fn priced_book(price: Decimal) -> Item {
        Item {
            url: "https://shop.test/solaris-p-1.html".to_string(),
            title: "Solaris".to_string(),
            price: Some(price),
            authors: vec!["Stanisław Lem".to_string()],
            ..Item::default()
        }
    }

    #[test]
    fn test_record_outcome_saves_and_finishes() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash", "https://shop.test/", 1).unwrap();
        let finished = outcome(vec![priced_book(Decimal::new(3990, 2))]);

        let saved = record_outcome(&mut storage, run_id, &finished).unwrap();

        assert_eq!(saved, 1);
        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.state, RunState::Completed);
        assert_eq!(run.stats, finished.stats);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_record_outcome_finishes_run_when_save_fails() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash", "https://shop.test/", 1).unwrap();
        let finished = outcome(vec![priced_book(Decimal::MAX)]);

        let result = record_outcome(&mut storage, run_id, &finished);

        assert!(matches!(
            result,
            Err(ShelfError::Storage(StorageError::InvalidValue { .. }))
        ));
        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.state, RunState::Completed);
        assert_eq!(run.stats.unique_added, 1);
    }
}
