//! Integration tests for Bulletin-Harvest
//!
//! Boards are served by a local wiremock server; no test touches the network.

mod batch_tests;
mod common;
mod crawl_tests;
