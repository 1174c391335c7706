//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a batch:
//! per-category counts, how each crawl ended and the newest titles.

use crate::crawler::BatchReport;
use crate::output::traits::{OutputResult, ReportWriter};
use std::path::{Path, PathBuf};

/// Number of newest titles listed per category
const NEWEST_TITLES: usize = 5;

/// Writes the markdown summary of a batch
#[derive(Debug, Clone)]
pub struct MarkdownSummaryWriter {
    path: PathBuf,
}

impl MarkdownSummaryWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportWriter for MarkdownSummaryWriter {
    fn render(&self, report: &BatchReport) -> OutputResult<String> {
        Ok(format_markdown_summary(report))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Formats a batch report as markdown
///
/// # Arguments
///
/// * `report` - The batch report
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(report: &BatchReport) -> String {
    let mut md = String::new();

    md.push_str("# Bulletin-Harvest Summary\n\n");

    // Batch metadata
    md.push_str("## Batch Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at.to_rfc3339()));
    let duration = (report.finished_at - report.started_at).num_seconds().max(0);
    md.push_str(&format!("- **Duration**: {} seconds\n", duration));
    md.push_str(&format!("- **Categories**: {}\n", report.categories.len()));
    md.push_str(&format!("- **New Posts**: {}\n", report.total_new_posts()));
    md.push_str(&format!("- **Stored**: {}\n\n", report.total_accepted()));

    // Per-category table
    md.push_str("## Categories\n\n");
    md.push_str("| Category | New | Stored | Duplicates | Failed | Pages | Ended |\n");
    md.push_str("|----------|-----|--------|------------|--------|-------|-------|\n");
    for category in &report.categories {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {}/{} | {} |\n",
            category.category,
            category.post_count(),
            category.persisted.accepted,
            category.persisted.duplicates,
            category.persisted.failed,
            category.pages_crawled,
            category.total_pages,
            category.termination
        ));
    }
    md.push('\n');

    // Newest titles
    let with_posts: Vec<_> = report
        .categories
        .iter()
        .filter(|c| !c.posts.is_empty())
        .collect();
    if !with_posts.is_empty() {
        md.push_str("## Newest Posts\n\n");
        for category in with_posts {
            md.push_str(&format!("### {}\n\n", category.category));
            for post in category.posts.iter().take(NEWEST_TITLES) {
                match &post.region {
                    Some(region) => md.push_str(&format!(
                        "- [{}]({}) ({})\n",
                        post.title, post.link, region
                    )),
                    None => md.push_str(&format!("- [{}]({})\n", post.title, post.link)),
                }
            }
            if category.posts.len() > NEWEST_TITLES {
                md.push_str(&format!(
                    "\n... and {} more\n",
                    category.posts.len() - NEWEST_TITLES
                ));
            }
            md.push('\n');
        }
    }

    // Aborted categories
    let aborted: Vec<_> = report.aborted_categories().collect();
    if !aborted.is_empty() {
        md.push_str("## Ended Early\n\n");
        for category in aborted {
            md.push_str(&format!(
                "- {} (after {} page(s))\n",
                category.category, category.pages_crawled
            ));
        }
        md.push('\n');
    }

    md
}
