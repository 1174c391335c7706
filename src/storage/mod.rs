//! Storage module for persisting harvest data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Per-category crawl state (the dedup high-water mark)
//! - Harvested posts, unique by link
//! - Run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{PostSink, RunHistory, StateStore, StorageError, StorageResult};

use crate::state::Termination;

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(HarvestError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> crate::Result<SqliteStorage> {
    Ok(SqliteStorage::new(path)?)
}

/// What happened to a batch handed to a `PostSink`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    /// Rows actually inserted
    pub accepted: usize,
    /// Items whose link was already stored
    pub duplicates: usize,
    /// Items skipped for validation or per-row database errors
    pub failed: usize,
}

impl PersistOutcome {
    pub fn total(&self) -> usize {
        self.accepted + self.duplicates + self.failed
    }
}

/// Figures recorded when a run row is closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub termination: Termination,
    pub pages_crawled: u32,
    pub new_posts: usize,
    pub accepted_posts: usize,
}

/// Represents a category run in the database
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub category: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    /// `None` while the run is still open
    pub termination: Option<Termination>,
    pub pages_crawled: u32,
    pub new_posts: u64,
    pub accepted_posts: u64,
}

impl RunRecord {
    pub fn is_open(&self) -> bool {
        self.finished_at.is_none()
    }
}
