//! Storage traits and error types
//!
//! The crawl core talks to persistence through two narrow collaborators:
//! a `StateStore` holding the per-category high-water mark and a `PostSink`
//! accepting harvested posts. `RunHistory` records one row per category run.

use crate::model::Post;
use crate::state::CrawlState;
use crate::storage::{PersistOutcome, RunRecord, RunSummary};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid post {link:?}: {reason}")]
    InvalidPost { link: String, reason: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Per-category high-water mark store
///
/// Writes must be idempotent: storing the same link twice leaves one row.
pub trait StateStore {
    /// Gets the stop marker of a category, `None` before its first productive run
    fn get_last_crawled_link(&self, category: &str) -> StorageResult<Option<String>>;

    /// Moves the stop marker of a category to `link`
    fn set_last_crawled_link(
        &mut self,
        category: &str,
        link: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// Gets the full state row of a category
    fn get_crawl_state(&self, category: &str) -> StorageResult<Option<CrawlState>>;

    /// Lists the state rows of all categories, ordered by name
    fn list_crawl_states(&self) -> StorageResult<Vec<CrawlState>>;

    /// Forgets every stop marker so the next run starts from scratch
    ///
    /// Returns the number of categories cleared.
    fn reset_crawl_state(&mut self) -> StorageResult<usize>;
}

/// Destination of harvested posts
///
/// `link` is unique across the sink. Re-submitting a stored link, or an
/// item failing validation, is skipped and counted instead of failing the batch.
pub trait PostSink {
    /// Stores `posts` under `category`
    fn persist(&mut self, posts: &[Post], category: &str) -> StorageResult<PersistOutcome>;

    /// Checks whether a link is already stored
    fn contains_link(&self, link: &str) -> StorageResult<bool>;

    /// Counts stored posts per category, ordered by name
    fn count_posts_by_category(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Counts all stored posts
    fn count_total_posts(&self) -> StorageResult<u64>;
}

/// Record of category runs
pub trait RunHistory {
    /// Opens a run row for `category`, returning its ID
    fn start_run(&mut self, category: &str, config_hash: &str) -> StorageResult<i64>;

    /// Closes a run row with its outcome
    fn finish_run(&mut self, run_id: i64, summary: &RunSummary) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent runs, newest first
    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;
}
