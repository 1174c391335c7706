//! JSON report of the posts harvested in a batch
//!
//! The report is an object keyed by category name, each entry carrying the
//! category, its post count and the posts themselves (newest first).

use crate::crawler::BatchReport;
use crate::model::Post;
use crate::output::traits::{OutputResult, ReportWriter};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct CategoryEntry<'a> {
    category: &'a str,
    post_count: usize,
    posts: &'a [Post],
}

/// Writes the pretty-printed JSON report of a batch
#[derive(Debug, Clone)]
pub struct JsonReportWriter {
    path: PathBuf,
}

impl JsonReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportWriter for JsonReportWriter {
    fn render(&self, report: &BatchReport) -> OutputResult<String> {
        render_json_report(report)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Renders the report as pretty-printed UTF-8 JSON
pub fn render_json_report(report: &BatchReport) -> OutputResult<String> {
    let entries: BTreeMap<&str, CategoryEntry> = report
        .categories
        .iter()
        .map(|c| {
            (
                c.category.as_str(),
                CategoryEntry {
                    category: &c.category,
                    post_count: c.posts.len(),
                    posts: &c.posts,
                },
            )
        })
        .collect();

    Ok(serde_json::to_string_pretty(&entries)?)
}
