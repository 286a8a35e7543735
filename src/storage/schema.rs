//! Database schema definitions and migrations
//!
//! This module contains all SQL schema definitions for the Shelf-Crawler database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs and their final counters
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    seed_url TEXT NOT NULL,
    max_pages INTEGER NOT NULL,
    state TEXT NOT NULL,
    pages_processed INTEGER NOT NULL DEFAULT 0,
    total_found INTEGER NOT NULL DEFAULT 0,
    unique_added INTEGER NOT NULL DEFAULT 0,
    duplicates_rejected INTEGER NOT NULL DEFAULT 0,
    missing_author_rejected INTEGER NOT NULL DEFAULT 0,
    missing_title_rejected INTEGER NOT NULL DEFAULT 0,
    detail_fetch_failures INTEGER NOT NULL DEFAULT 0,
    listing_fetch_failures INTEGER NOT NULL DEFAULT 0
);

-- Catalog items, identified by URL
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    price_cents INTEGER,
    publisher TEXT,
    year INTEGER,
    first_seen_run INTEGER NOT NULL REFERENCES runs(id),
    last_seen_run INTEGER NOT NULL REFERENCES runs(id),
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_price ON items(price_cents);
CREATE INDEX IF NOT EXISTS idx_items_year ON items(year);
CREATE INDEX IF NOT EXISTS idx_items_publisher ON items(publisher);
CREATE INDEX IF NOT EXISTS idx_items_last_seen ON items(last_seen_run);

-- Ordered author lists
CREATE TABLE IF NOT EXISTS item_authors (
    item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    PRIMARY KEY(item_id, position)
);

CREATE INDEX IF NOT EXISTS idx_item_authors_name ON item_authors(name);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
