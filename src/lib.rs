//! Bulletin-Harvest: incremental harvester for paginated bulletin boards
//!
//! This crate walks the list pages of explicitly configured boards, enriches each
//! row with its detail-page body and a region tag, and stops at the newest post
//! seen by the previous run so that every run emits only new posts.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Bulletin-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Detail fetch for {url} timed out after {timeout_ms}ms")]
    DetailTimeout { url: String, timeout_ms: u64 },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown category '{name}', available: {available:?}")]
    UnknownCategory {
        name: String,
        available: Vec<String>,
    },
}

/// Failures surfaced by the retrying transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl TransportError {
    /// Returns true if the failure is worth another attempt
    ///
    /// HTTP 429/500/502/503/504 and request timeouts are transient.
    /// Every other status, connection refusal and DNS failure are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Timeout { .. } => true,
            Self::Connect { .. } | Self::Request { .. } | Self::Client(_) => false,
        }
    }
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Empty link target")]
    Empty,
}

/// Result type alias for Bulletin-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for transport operations
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{BoardConfig, BoardKind, Config};
pub use crawler::{Coordinator, Transport};
pub use model::Post;
pub use state::{CrawlPhase, CrawlState};
