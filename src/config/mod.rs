//! Configuration module for Bulletin-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use bulletin_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Boards configured: {}", config.boards.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BoardConfig, BoardEntry, BoardKind, Config, CrawlerConfig, OutputConfig, RegionConfig,
    TransportConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, select_boards};
