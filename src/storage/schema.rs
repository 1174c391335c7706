//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Bulletin-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track category runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    termination TEXT,
    pages_crawled INTEGER NOT NULL DEFAULT 0,
    new_posts INTEGER NOT NULL DEFAULT 0,
    accepted_posts INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_runs_category ON runs(category);

-- Harvested posts, one row per link
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL,
    category_group TEXT NOT NULL,
    welfare_category TEXT,
    ordinal_id INTEGER NOT NULL DEFAULT 0,
    title TEXT NOT NULL,
    link TEXT NOT NULL UNIQUE,
    department TEXT NOT NULL DEFAULT '',
    published_date TEXT NOT NULL DEFAULT '',
    views INTEGER NOT NULL DEFAULT 0,
    has_attachment INTEGER NOT NULL DEFAULT 0,
    content TEXT NOT NULL DEFAULT '',
    region TEXT,
    crawled_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_posts_category ON posts(category);
CREATE INDEX IF NOT EXISTS idx_posts_region ON posts(region);

-- Dedup high-water mark per category
CREATE TABLE IF NOT EXISTS crawl_state (
    category_name TEXT PRIMARY KEY,
    last_crawled_link TEXT,
    last_crawled_at TEXT NOT NULL
);
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
