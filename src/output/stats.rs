//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! what has been harvested so far.

use crate::state::CrawlState;
use crate::storage::{PostSink, RunHistory, RunRecord, StateStore};
use chrono::Utc;

/// Number of runs shown by `print_statistics`
pub const RECENT_RUNS: usize = 10;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of stored posts
    pub total_posts: u64,

    /// Stored posts per category, ordered by name
    pub posts_by_category: Vec<(String, u64)>,

    /// Last-crawled link of every category
    pub crawl_states: Vec<CrawlState>,

    /// Most recent runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics<S>(storage: &S) -> crate::Result<HarvestStatistics>
where
    S: StateStore + PostSink + RunHistory,
{
    Ok(HarvestStatistics {
        total_posts: storage.count_total_posts()?,
        posts_by_category: storage.count_posts_by_category()?,
        crawl_states: storage.list_crawl_states()?,
        recent_runs: storage.recent_runs(RECENT_RUNS)?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Total posts stored: {}", stats.total_posts);
    println!("  Categories with posts: {}", stats.posts_by_category.len());
    println!();

    if !stats.posts_by_category.is_empty() {
        println!("Posts by Category:");
        for (category, count) in &stats.posts_by_category {
            let percentage = if stats.total_posts > 0 {
                (*count as f64 / stats.total_posts as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", category, count, percentage);
        }
        println!();
    }

    if !stats.crawl_states.is_empty() {
        let now = Utc::now();
        println!("Last Crawled:");
        for state in &stats.crawl_states {
            println!(
                "  {}: {} ({}h ago)",
                state.category_name,
                state.last_crawled_link.as_deref().unwrap_or("-"),
                state.age(now).num_hours()
            );
        }
        println!();
    }

    if !stats.recent_runs.is_empty() {
        println!("Recent Runs:");
        for run in &stats.recent_runs {
            let ended = run
                .termination
                .map(|t| t.to_string())
                .unwrap_or_else(|| "running".to_string());
            println!(
                "  #{} {} [{}] {} page(s), {} new, {} stored, started {}",
                run.id,
                run.category,
                ended,
                run.pages_crawled,
                run.new_posts,
                run.accepted_posts,
                run.started_at
            );
        }
    }
}
