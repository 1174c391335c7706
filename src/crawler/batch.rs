//! Batch driver: crawls a list of boards and persists what each one yields

use crate::config::BoardConfig;
use crate::crawler::coordinator::{Coordinator, CrawlOutcome};
use crate::model::Post;
use crate::state::Termination;
use crate::storage::{PersistOutcome, PostSink, RunHistory, RunSummary, StateStore, StorageError};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::{Arc, Mutex};

/// What one board produced in a batch
#[derive(Debug, Clone)]
pub struct CategoryReport {
    pub category: String,
    /// New posts, newest first
    pub posts: Vec<Post>,
    pub persisted: PersistOutcome,
    pub termination: Termination,
    pub pages_crawled: u32,
    pub total_pages: u32,
    /// Run row ID, `None` when the run could not be recorded
    pub run_id: Option<i64>,
}

impl CategoryReport {
    pub fn post_count(&self) -> usize {
        self.posts.len()
    }
}

/// Outcome of a whole batch, one entry per board in input order
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub categories: Vec<CategoryReport>,
}

impl BatchReport {
    pub fn total_new_posts(&self) -> usize {
        self.categories.iter().map(CategoryReport::post_count).sum()
    }

    pub fn total_accepted(&self) -> usize {
        self.categories.iter().map(|c| c.persisted.accepted).sum()
    }

    pub fn aborted_categories(&self) -> impl Iterator<Item = &CategoryReport> {
        self.categories
            .iter()
            .filter(|c| c.termination == Termination::Aborted)
    }
}

/// Crawls `boards` and stores their new posts
///
/// At most `max_concurrent` boards are crawled at once; the report keeps the
/// order of `boards`. Storage failures are logged and never stop the batch.
pub async fn run_batch<S>(
    coordinator: &Coordinator<S>,
    boards: &[BoardConfig],
    config_hash: &str,
    max_concurrent: usize,
) -> BatchReport
where
    S: StateStore + PostSink + RunHistory,
{
    let started_at = Utc::now();
    tracing::info!(boards = boards.len(), max_concurrent, "Starting batch");

    let categories: Vec<CategoryReport> = stream::iter(boards)
        .map(|board| run_board(coordinator, board, config_hash))
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    let report = BatchReport {
        started_at,
        finished_at: Utc::now(),
        categories,
    };

    tracing::info!(
        new_posts = report.total_new_posts(),
        accepted = report.total_accepted(),
        aborted = report.aborted_categories().count(),
        "Batch finished"
    );

    report
}

async fn run_board<S>(
    coordinator: &Coordinator<S>,
    board: &BoardConfig,
    config_hash: &str,
) -> CategoryReport
where
    S: StateStore + PostSink + RunHistory,
{
    let store = coordinator.store();
    let category = board.category_name.as_str();

    let run_id = match with_store(store, |s| s.start_run(category, config_hash)) {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::error!(category, error = %e, "Failed to record run start");
            None
        }
    };

    let outcome: CrawlOutcome = coordinator.run_category(board).await;
    let termination = outcome
        .phase
        .termination()
        .unwrap_or(Termination::Aborted);

    let persisted = if outcome.posts.is_empty() {
        PersistOutcome::default()
    } else {
        match with_store(store, |s| s.persist(&outcome.posts, category)) {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::error!(category, posts = outcome.posts.len(), error = %e, "Failed to persist posts");
                PersistOutcome {
                    failed: outcome.posts.len(),
                    ..PersistOutcome::default()
                }
            }
        }
    };

    if persisted.duplicates > 0 || persisted.failed > 0 {
        tracing::warn!(
            category,
            duplicates = persisted.duplicates,
            failed = persisted.failed,
            "Some posts were not stored"
        );
    }

    if let Some(run_id) = run_id {
        let summary = RunSummary {
            termination,
            pages_crawled: outcome.pages_crawled,
            new_posts: outcome.posts.len(),
            accepted_posts: persisted.accepted,
        };
        if let Err(e) = with_store(store, |s| s.finish_run(run_id, &summary)) {
            tracing::error!(category, run_id, error = %e, "Failed to record run end");
        }
    }

    CategoryReport {
        category: outcome.category,
        posts: outcome.posts,
        persisted,
        termination,
        pages_crawled: outcome.pages_crawled,
        total_pages: outcome.total_pages,
        run_id,
    }
}

/// Runs `f` under the store lock
fn with_store<S, T>(
    store: &Arc<Mutex<S>>,
    f: impl FnOnce(&mut S) -> Result<T, StorageError>,
) -> Result<T, StorageError> {
    let mut guard = store.lock().map_err(|_| StorageError::LockPoisoned)?;
    f(&mut *guard)
}
