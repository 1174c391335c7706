//! Output module for batch reports and statistics
//!
//! This module handles:
//! - Writing the JSON report of newly harvested posts
//! - Generating markdown summaries of a batch
//! - Printing statistics of the harvest database

mod json;
mod markdown;
pub mod stats;
mod traits;

pub use json::{render_json_report, JsonReportWriter};
pub use markdown::{format_markdown_summary, MarkdownSummaryWriter};
pub use stats::{load_statistics, print_statistics, HarvestStatistics};
pub use traits::{OutputError, OutputResult, ReportWriter};

use crate::config::OutputConfig;
use crate::crawler::BatchReport;

/// Builds the writers enabled in the output configuration
pub fn configured_writers(config: &OutputConfig) -> Vec<Box<dyn ReportWriter>> {
    let mut writers: Vec<Box<dyn ReportWriter>> = Vec::new();

    if let Some(path) = &config.report_path {
        writers.push(Box::new(JsonReportWriter::new(path)));
    }
    if let Some(path) = &config.summary_path {
        writers.push(Box::new(MarkdownSummaryWriter::new(path)));
    }

    writers
}

/// Writes every configured report for a batch
///
/// # Arguments
///
/// * `report` - The finished batch
/// * `config` - Output paths
///
/// # Returns
///
/// * `Ok(usize)` - Number of files written
/// * `Err(OutputError)` - The first write that failed
pub fn write_reports(report: &BatchReport, config: &OutputConfig) -> OutputResult<usize> {
    let writers = configured_writers(config);

    for writer in &writers {
        writer.write(report)?;
        tracing::info!(path = %writer.path().display(), "Wrote report");
    }

    Ok(writers.len())
}
