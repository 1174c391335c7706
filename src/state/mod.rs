//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the orchestrator's per-category state machine
//! - `CrawlState`: the persisted high-water mark of a category

mod crawl_phase;
mod crawl_state;

// Re-export main types
pub use crawl_phase::{CrawlPhase, Termination};
pub use crawl_state::CrawlState;
