//! Output writer trait and error types

use crate::crawler::BatchReport;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A destination for the results of a batch
pub trait ReportWriter {
    /// Renders `report` to its textual form
    fn render(&self, report: &BatchReport) -> OutputResult<String>;

    /// Path the rendered report is written to
    fn path(&self) -> &Path;

    /// Renders `report` and writes it to `path()`, creating parent directories
    fn write(&self, report: &BatchReport) -> OutputResult<()> {
        let rendered = self.render(report)?;
        let path = self.path();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| OutputError::Write {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        std::fs::write(path, rendered).map_err(|e| OutputError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
