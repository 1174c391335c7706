//! Crawler module for bulletin board harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic and charset-aware body decoding
//! - Pagination discovery and list page parsing
//! - Detail page enrichment and region tagging
//! - Per-category crawl coordination and the batch driver

mod batch;
mod charset;
mod coordinator;
mod detail;
mod fetcher;
mod pagination;
mod parser;
mod region;

pub use batch::{run_batch, BatchReport, CategoryReport};
pub use charset::{charset_from_content_type, charset_from_meta, decode_body};
pub use coordinator::{Coordinator, CrawlOutcome};
pub use detail::{enrich_posts, extract_content, fetch_detail_content};
pub use fetcher::{RetryPolicy, Transport};
pub use pagination::resolve_total_pages;
pub use parser::{classify_trailing_cells, parse_list_page, TrailingFields};
pub use region::{RegionTagger, DEFAULT_REGIONS};
