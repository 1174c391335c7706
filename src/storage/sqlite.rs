//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.

use crate::model::{Post, PostCategory, WelfareCategory};
use crate::state::{CrawlState, Termination};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PostSink, RunHistory, StateStore, StorageError, StorageResult};
use crate::storage::{PersistOutcome, RunRecord, RunSummary};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

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
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Loads the stored posts of a category in insertion order
    pub fn load_posts(&self, category: &str) -> StorageResult<Vec<Post>> {
        let mut stmt = self.conn.prepare(
            "SELECT ordinal_id, title, link, department, published_date, views,
             has_attachment, content, region
             FROM posts WHERE category = ?1 ORDER BY id",
        )?;

        let posts = stmt
            .query_map(params![category], |row| {
                Ok(Post {
                    ordinal_id: row.get(0)?,
                    title: row.get(1)?,
                    link: row.get(2)?,
                    department: row.get(3)?,
                    published_date: row.get(4)?,
                    views: row.get::<_, i64>(5)?.max(0) as u64,
                    has_attachment: row.get(6)?,
                    content: row.get(7)?,
                    region: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }
}

fn parse_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Database(format!("Bad timestamp '{}': {}", raw, e)))
}

fn validate_post(post: &Post) -> StorageResult<()> {
    if post.link.trim().is_empty() {
        return Err(StorageError::InvalidPost {
            link: post.link.clone(),
            reason: "empty link".to_string(),
        });
    }
    if post.title.trim().is_empty() {
        return Err(StorageError::InvalidPost {
            link: post.link.clone(),
            reason: "empty title".to_string(),
        });
    }
    Ok(())
}

fn run_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
    let termination: Option<String> = row.get(5)?;
    Ok(RunRecord {
        id: row.get(0)?,
        category: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        termination: termination.as_deref().and_then(Termination::from_db_string),
        pages_crawled: row.get(6)?,
        new_posts: row.get::<_, i64>(7)?.max(0) as u64,
        accepted_posts: row.get::<_, i64>(8)?.max(0) as u64,
    })
}

const RUN_COLUMNS: &str = "id, category, started_at, finished_at, config_hash, termination,
     pages_crawled, new_posts, accepted_posts";

impl StateStore for SqliteStorage {
    fn get_last_crawled_link(&self, category: &str) -> StorageResult<Option<String>> {
        let link: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT last_crawled_link FROM crawl_state WHERE category_name = ?1",
                params![category],
                |row| row.get(0),
            )
            .optional()?;

        Ok(link.flatten())
    }

    fn set_last_crawled_link(
        &mut self,
        category: &str,
        link: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO crawl_state (category_name, last_crawled_link, last_crawled_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(category_name) DO UPDATE SET
                last_crawled_link = excluded.last_crawled_link,
                last_crawled_at = excluded.last_crawled_at",
            params![category, link, at.to_rfc3339()],
        )?;
        Ok(())
    }

    fn get_crawl_state(&self, category: &str) -> StorageResult<Option<CrawlState>> {
        let row: Option<(Option<String>, String)> = self
            .conn
            .query_row(
                "SELECT last_crawled_link, last_crawled_at FROM crawl_state WHERE category_name = ?1",
                params![category],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((link, at)) => Ok(Some(CrawlState {
                category_name: category.to_string(),
                last_crawled_link: link,
                last_crawled_at: parse_timestamp(&at)?,
            })),
            None => Ok(None),
        }
    }

    fn list_crawl_states(&self) -> StorageResult<Vec<CrawlState>> {
        let mut stmt = self.conn.prepare(
            "SELECT category_name, last_crawled_link, last_crawled_at
             FROM crawl_state ORDER BY category_name",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(category_name, last_crawled_link, at)| {
                Ok(CrawlState {
                    category_name,
                    last_crawled_link,
                    last_crawled_at: parse_timestamp(&at)?,
                })
            })
            .collect()
    }

    fn reset_crawl_state(&mut self) -> StorageResult<usize> {
        let cleared = self.conn.execute("DELETE FROM crawl_state", [])?;
        Ok(cleared)
    }
}

impl PostSink for SqliteStorage {
    fn persist(&mut self, posts: &[Post], category: &str) -> StorageResult<PersistOutcome> {
        let group = PostCategory::from_category_name(category);
        let welfare = WelfareCategory::from_category_name(category);
        let crawled_at = Utc::now().to_rfc3339();
        let mut outcome = PersistOutcome::default();

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO posts (category, category_group, welfare_category,
                 ordinal_id, title, link, department, published_date, views, has_attachment,
                 content, region, crawled_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;

            for post in posts {
                if let Err(e) = validate_post(post) {
                    tracing::warn!(category, link = %post.link, error = %e, "Skipping invalid post");
                    outcome.failed += 1;
                    continue;
                }

                let inserted = stmt.execute(params![
                    category,
                    group.to_db_string(),
                    welfare.map(|w| w.to_db_string()),
                    post.ordinal_id,
                    post.title,
                    post.link,
                    post.department,
                    post.published_date,
                    post.views as i64,
                    post.has_attachment,
                    post.content,
                    post.region,
                    crawled_at,
                ]);

                match inserted {
                    Ok(0) => outcome.duplicates += 1,
                    Ok(_) => outcome.accepted += 1,
                    Err(e) => {
                        tracing::error!(category, link = %post.link, error = %e, "Failed to store post");
                        outcome.failed += 1;
                    }
                }
            }
        }
        tx.commit()?;

        Ok(outcome)
    }

    fn contains_link(&self, link: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM posts WHERE link = ?1",
                params![link],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn count_posts_by_category(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT category, COUNT(*) FROM posts GROUP BY category ORDER BY category")?;

        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?.max(0) as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn count_total_posts(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl RunHistory for SqliteStorage {
    fn start_run(&mut self, category: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (category, started_at, config_hash) VALUES (?1, ?2, ?3)",
            params![category, now, config_hash],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(&mut self, run_id: i64, summary: &RunSummary) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET finished_at = ?1, termination = ?2, pages_crawled = ?3,
             new_posts = ?4, accepted_posts = ?5 WHERE id = ?6",
            params![
                now,
                summary.termination.to_db_string(),
                summary.pages_crawled,
                summary.new_posts as i64,
                summary.accepted_posts as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT ?1", RUN_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let runs = stmt
            .query_map(params![limit as i64], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }
}
