//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! Prices are stored as integer cents so they stay exact and sort correctly.

use crate::catalog::Item;
use crate::state::{CrawlStats, RunState};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{count_line, format_price, item_line, AnalysisResult, RunRecord};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, seed_url, max_pages, state,
     pages_processed, total_found, unique_added, duplicates_rejected,
     missing_author_rejected, missing_title_rejected, detail_fetch_failures,
     listing_fetch_failures";

const ITEM_COLUMNS: &str = "id, url, title, price_cents, publisher, year";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Runs an item query selecting `ITEM_COLUMNS` and attaches authors
    fn query_items<P: Params>(&self, sql: &str, params: P) -> StorageResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            let id: i64 = row.get(0)?;
            let price_cents: Option<i64> = row.get(3)?;
            let item = Item {
                url: row.get(1)?,
                title: row.get(2)?,
                price: price_cents.map(|cents| Decimal::new(cents, 2)),
                publisher: row.get(4)?,
                year: row.get(5)?,
                authors: Vec::new(),
            };
            Ok((id, item))
        })?;

        let mut authors_stmt = self
            .conn
            .prepare("SELECT name FROM item_authors WHERE item_id = ?1 ORDER BY position")?;

        let mut items = Vec::new();
        for row in rows {
            let (id, mut item) = row?;
            item.authors = authors_stmt
                .query_map(params![id], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            items.push(item);
        }

        Ok(items)
    }

    /// Runs a `(name, count)` query and formats it as an analysis
    fn query_counts<P: Params>(&self, sql: &str, params: P) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut lines = Vec::new();
        for row in rows {
            let (name, count) = row?;
            lines.push(count_line(&name, count as u64));
        }
        Ok(lines)
    }
}

/// Converts a price to integer cents
fn to_cents(price: Decimal) -> StorageResult<i64> {
    price
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.round().to_i64())
        .ok_or_else(|| StorageError::InvalidValue {
            column: "price_cents",
            value: price.to_string(),
        })
}

/// Maps a `runs` row; an unknown state string is reported, not guessed
fn run_from_row(row: &Row<'_>) -> rusqlite::Result<StorageResult<RunRecord>> {
    let counter = |idx: usize| -> rusqlite::Result<u64> { Ok(row.get::<_, i64>(idx)? as u64) };

    let state_text: String = row.get(6)?;
    let Some(state) = RunState::from_db_string(&state_text) else {
        return Ok(Err(StorageError::InvalidValue {
            column: "state",
            value: state_text,
        }));
    };

    Ok(Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        seed_url: row.get(4)?,
        max_pages: row.get(5)?,
        state,
        stats: CrawlStats {
            pages_processed: counter(7)?,
            total_found: counter(8)?,
            unique_added: counter(9)?,
            duplicates_rejected: counter(10)?,
            missing_author_rejected: counter(11)?,
            missing_title_rejected: counter(12)?,
            detail_fetch_failures: counter(13)?,
            listing_fetch_failures: counter(14)?,
        },
    }))
}

fn priced_lines(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.price.map(|price| item_line(item, &format_price(price))))
        .collect()
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(
        &mut self,
        config_hash: &str,
        seed_url: &str,
        max_pages: u32,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, seed_url, max_pages, state)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                now,
                config_hash,
                seed_url,
                max_pages,
                RunState::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        state: RunState,
        stats: &CrawlStats,
    ) -> StorageResult<()> {
        let run = self.get_run(run_id)?;
        if run.state.is_terminal() {
            return Err(StorageError::RunAlreadyFinished {
                run_id,
                state: run.state,
            });
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET
                state = ?1, finished_at = ?2,
                pages_processed = ?3, total_found = ?4, unique_added = ?5,
                duplicates_rejected = ?6, missing_author_rejected = ?7,
                missing_title_rejected = ?8, detail_fetch_failures = ?9,
                listing_fetch_failures = ?10
             WHERE id = ?11",
            params![
                state.to_db_string(),
                now,
                stats.pages_processed as i64,
                stats.total_found as i64,
                stats.unique_added as i64,
                stats.duplicates_rejected as i64,
                stats.missing_author_rejected as i64,
                stats.missing_title_rejected as i64,
                stats.detail_fetch_failures as i64,
                stats.listing_fetch_failures as i64,
                run_id
            ],
        )?;
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))?
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, [], run_from_row)
            .optional()?
            .transpose()
    }

    // ===== Item Management =====

    fn save_items(&mut self, run_id: i64, items: &[Item]) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        {
            let mut upsert = tx.prepare(
                "INSERT INTO items
                    (url, title, price_cents, publisher, year, first_seen_run, last_seen_run, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7)
                 ON CONFLICT(url) DO UPDATE SET
                    title = excluded.title,
                    price_cents = excluded.price_cents,
                    publisher = excluded.publisher,
                    year = excluded.year,
                    last_seen_run = excluded.last_seen_run,
                    updated_at = excluded.updated_at",
            )?;
            let mut find_id = tx.prepare("SELECT id FROM items WHERE url = ?1")?;
            let mut clear_authors = tx.prepare("DELETE FROM item_authors WHERE item_id = ?1")?;
            let mut insert_author = tx.prepare(
                "INSERT INTO item_authors (item_id, position, name) VALUES (?1, ?2, ?3)",
            )?;

            for item in items {
                let price_cents = item.price.map(to_cents).transpose()?;
                upsert.execute(params![
                    item.url,
                    item.title,
                    price_cents,
                    item.publisher,
                    item.year,
                    run_id,
                    now
                ])?;

                let item_id: i64 = find_id.query_row(params![item.url], |row| row.get(0))?;
                clear_authors.execute(params![item_id])?;
                for (position, name) in item.authors.iter().enumerate() {
                    insert_author.execute(params![item_id, position as i64, name])?;
                }
            }
        }

        tx.commit()?;
        tracing::debug!("Saved {} items for run {}", items.len(), run_id);
        Ok(items.len())
    }

    fn count_items(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn load_recent_items(&self, limit: u32) -> StorageResult<Vec<Item>> {
        let sql = format!(
            "SELECT {} FROM items ORDER BY last_seen_run DESC, id ASC LIMIT ?1",
            ITEM_COLUMNS
        );
        self.query_items(&sql, params![limit])
    }

    // ===== Analyses =====

    fn most_expensive(&self, limit: u32) -> StorageResult<AnalysisResult> {
        let sql = format!(
            "SELECT {} FROM items WHERE price_cents IS NOT NULL
             ORDER BY price_cents DESC, title ASC LIMIT ?1",
            ITEM_COLUMNS
        );
        let items = self.query_items(&sql, params![limit])?;
        Ok(AnalysisResult::new("Most expensive", priced_lines(&items)))
    }

    fn cheapest(&self, limit: u32) -> StorageResult<AnalysisResult> {
        let sql = format!(
            "SELECT {} FROM items WHERE price_cents IS NOT NULL
             ORDER BY price_cents ASC, title ASC LIMIT ?1",
            ITEM_COLUMNS
        );
        let items = self.query_items(&sql, params![limit])?;
        Ok(AnalysisResult::new("Cheapest", priced_lines(&items)))
    }

    fn cheaper_than(&self, max_price: Decimal, limit: u32) -> StorageResult<AnalysisResult> {
        let sql = format!(
            "SELECT {} FROM items WHERE price_cents < ?1
             ORDER BY price_cents ASC, title ASC LIMIT ?2",
            ITEM_COLUMNS
        );
        let items = self.query_items(&sql, params![to_cents(max_price)?, limit])?;
        Ok(AnalysisResult::new("Cheaper than", priced_lines(&items))
            .with_parameter(format!("price below {}", format_price(max_price))))
    }

    fn published_after(&self, year: i32, limit: u32) -> StorageResult<AnalysisResult> {
        let sql = format!(
            "SELECT {} FROM items WHERE year > ?1
             ORDER BY year DESC, title ASC LIMIT ?2",
            ITEM_COLUMNS
        );
        let items = self.query_items(&sql, params![year, limit])?;
        let lines = items
            .iter()
            .filter_map(|item| item.year.map(|y| item_line(item, &y.to_string())))
            .collect();
        Ok(AnalysisResult::new("Published after", lines)
            .with_parameter(format!("published after {}", year)))
    }

    fn authors_by_average_price(&self, limit: u32) -> StorageResult<AnalysisResult> {
        let mut stmt = self.conn.prepare(
            "SELECT a.name, SUM(i.price_cents), COUNT(*)
             FROM item_authors a JOIN items i ON i.id = a.item_id
             WHERE i.price_cents IS NOT NULL
             GROUP BY a.name
             ORDER BY AVG(i.price_cents) DESC, a.name ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut lines = Vec::new();
        for row in rows {
            let (name, total_cents, count) = row?;
            if count == 0 {
                continue;
            }
            let average = (Decimal::new(total_cents, 2) / Decimal::from(count))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            lines.push(format!("{} ({})", name, format_price(average)));
        }

        Ok(AnalysisResult::new("Authors by average price", lines))
    }

    fn top_publishers(&self, limit: u32) -> StorageResult<AnalysisResult> {
        let lines = self.query_counts(
            "SELECT publisher, COUNT(*) AS n FROM items
             WHERE publisher IS NOT NULL AND publisher <> ''
             GROUP BY publisher
             ORDER BY n DESC, publisher ASC
             LIMIT ?1",
            params![limit],
        )?;
        Ok(AnalysisResult::new("Top publishers", lines))
    }

    fn top_authors(&self, limit: u32) -> StorageResult<AnalysisResult> {
        let lines = self.query_counts(
            "SELECT name, COUNT(DISTINCT item_id) AS n FROM item_authors
             GROUP BY name
             ORDER BY n DESC, name ASC
             LIMIT ?1",
            params![limit],
        )?;
        Ok(AnalysisResult::new("Top authors", lines))
    }

    fn authors_published_after(&self, year: i32, limit: u32) -> StorageResult<AnalysisResult> {
        let lines = self.query_counts(
            "SELECT a.name, COUNT(DISTINCT a.item_id) AS n
             FROM item_authors a JOIN items i ON i.id = a.item_id
             WHERE i.year > ?1
             GROUP BY a.name
             ORDER BY n DESC, a.name ASC
             LIMIT ?2",
            params![year, limit],
        )?;
        Ok(AnalysisResult::new("Authors with books after", lines)
            .with_parameter(format!("published after {}", year)))
    }
}
