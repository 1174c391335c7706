//! Crawl coordinator - per-category crawl orchestration
//!
//! This module drives one board through its list pages:
//! - Resolving the page count from page 1
//! - Fetching and parsing each list page in order
//! - Enriching rows with detail content and region tags
//! - Stopping at the link recorded by the previous run
//! - Moving the stored marker to the newest collected post

use crate::config::{BoardConfig, Config, CrawlerConfig};
use crate::crawler::detail::enrich_posts;
use crate::crawler::pagination::resolve_total_pages;
use crate::crawler::parser::parse_list_page;
use crate::crawler::region::RegionTagger;
use crate::crawler::Transport;
use crate::model::Post;
use crate::state::CrawlPhase;
use crate::storage::{StateStore, StorageError, StorageResult};
use crate::url::list_page_url;
use chrono::Utc;
use scraper::Html;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Result of crawling one category
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub category: String,
    /// New posts, newest first
    pub posts: Vec<Post>,
    /// List pages parsed during the run
    pub pages_crawled: u32,
    /// Page count announced by the board (1 when page 1 could not be fetched)
    pub total_pages: u32,
    /// Terminal phase the run ended in
    pub phase: CrawlPhase,
}

/// Main crawl coordinator
///
/// Owns the transport and reads/writes the per-category marker through a
/// shared `StateStore`. Boards are crawled independently; one coordinator can
/// serve several boards at once.
pub struct Coordinator<S> {
    transport: Transport,
    store: Arc<Mutex<S>>,
    tagger: RegionTagger,
    detail_concurrency: usize,
    detail_timeout: Duration,
}

impl<S: StateStore> Coordinator<S> {
    /// Creates a coordinator from explicit parts
    pub fn new(
        transport: Transport,
        store: Arc<Mutex<S>>,
        tagger: RegionTagger,
        settings: &CrawlerConfig,
    ) -> Self {
        Self {
            transport,
            store,
            tagger,
            detail_concurrency: settings.detail_concurrency.max(1) as usize,
            detail_timeout: Duration::from_millis(settings.detail_timeout_ms),
        }
    }

    /// Creates a coordinator with the transport and region list described by `config`
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn from_config(config: &Config, store: Arc<Mutex<S>>) -> crate::Result<Self> {
        let transport = Transport::new(&config.transport)?;
        Ok(Self::new(
            transport,
            store,
            RegionTagger::from_config(&config.regions),
            &config.crawler,
        ))
    }

    pub fn store(&self) -> &Arc<Mutex<S>> {
        &self.store
    }

    /// Crawls one board and returns its new posts, newest first
    ///
    /// Never fails: list-page failures end the run early with what was
    /// collected, detail failures leave a post's content empty.
    pub async fn crawl_category(&self, board: &BoardConfig) -> Vec<Post> {
        self.run_category(board).await.posts
    }

    /// Crawls one board and reports how the run ended
    pub async fn run_category(&self, board: &BoardConfig) -> CrawlOutcome {
        let category = board.category_name.as_str();
        let marker = self.read_marker(category);

        tracing::info!(
            category,
            has_marker = marker.is_some(),
            limit = board.pages_to_crawl_limit,
            "Starting category crawl"
        );

        let mut phase = CrawlPhase::ResolvingPagination;
        let mut collected: Vec<Post> = Vec::new();
        let mut pages_crawled = 0u32;

        let first_url = list_page_url(&board.list_page_url_prefix, 1);
        let first_body = match self.transport.fetch(&first_url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(category, url = %first_url, error = %e, "First list page unavailable");
                advance(&mut phase, CrawlPhase::Aborted(1));
                return self.finish(category, collected, pages_crawled, 1, phase);
            }
        };

        let total_pages = {
            let document = Html::parse_document(&first_body);
            resolve_total_pages(&document)
        };
        // Page 1 is already in hand, so at least one page is crawled
        let pages_to_crawl = total_pages.min(board.pages_to_crawl_limit).max(1);
        tracing::debug!(category, total_pages, pages_to_crawl, "Resolved pagination");

        let mut pending_body = Some(first_body);
        let mut page = 1u32;
        advance(&mut phase, CrawlPhase::FetchingPage(page));

        loop {
            // ===== FetchingPage(n) =====
            let page_url = list_page_url(&board.list_page_url_prefix, page);
            let body = match pending_body.take() {
                Some(body) => body,
                None => match self.transport.fetch(&page_url).await {
                    Ok(body) => body,
                    Err(e) => {
                        tracing::warn!(category, page, error = %e, "List page fetch failed; ending run early");
                        advance(&mut phase, CrawlPhase::Aborted(page));
                        break;
                    }
                },
            };

            let base = match Url::parse(&page_url) {
                Ok(base) => base,
                Err(e) => {
                    tracing::warn!(category, page, url = %page_url, error = %e, "Unusable list page URL");
                    advance(&mut phase, CrawlPhase::Aborted(page));
                    break;
                }
            };

            let rows = {
                let document = Html::parse_document(&body);
                parse_list_page(&document, &base, board.kind)
            };
            pages_crawled += 1;

            // Rows at and after the marker are never emitted, so they are not enriched
            let (mut fresh, marker_found) = split_at_marker(rows, marker.as_deref());
            tracing::debug!(category, page, rows = fresh.len(), marker_found, "Parsed list page");

            // ===== EnrichingPage(n) =====
            advance(&mut phase, CrawlPhase::EnrichingPage(page));
            let empty = enrich_posts(
                &self.transport,
                &mut fresh,
                self.detail_concurrency,
                self.detail_timeout,
            )
            .await;
            if empty > 0 {
                tracing::debug!(category, page, empty, "Posts left without content");
            }
            for post in fresh.iter_mut() {
                post.region = self.tagger.tag(&post.title, &post.content).map(str::to_string);
            }

            // ===== EvaluatingPage(n) =====
            advance(&mut phase, CrawlPhase::EvaluatingPage(page));
            collected.extend(fresh);

            if marker_found {
                advance(&mut phase, CrawlPhase::Stopped(page));
                break;
            }
            if page >= pages_to_crawl {
                advance(&mut phase, CrawlPhase::Exhausted(page));
                break;
            }

            page += 1;
            advance(&mut phase, CrawlPhase::FetchingPage(page));
        }

        self.finish(category, collected, pages_crawled, total_pages, phase)
    }

    fn finish(
        &self,
        category: &str,
        posts: Vec<Post>,
        pages_crawled: u32,
        total_pages: u32,
        phase: CrawlPhase,
    ) -> CrawlOutcome {
        if let Some(newest) = posts.first() {
            self.write_marker(category, &newest.link);
        }

        tracing::info!(
            category,
            %phase,
            pages_crawled,
            new_posts = posts.len(),
            "Category crawl finished"
        );

        CrawlOutcome {
            category: category.to_string(),
            posts,
            pages_crawled,
            total_pages,
            phase,
        }
    }

    /// Reads the stored marker; a failed read is treated as a first run
    fn read_marker(&self, category: &str) -> Option<String> {
        let result: StorageResult<Option<String>> = match self.store.lock() {
            Ok(store) => store.get_last_crawled_link(category),
            Err(_) => Err(StorageError::LockPoisoned),
        };

        match result {
            Ok(link) => link,
            Err(e) => {
                tracing::warn!(category, error = %e, "Could not read last crawled link; crawling as first run");
                None
            }
        }
    }

    fn write_marker(&self, category: &str, link: &str) {
        let result = match self.store.lock() {
            Ok(mut store) => store.set_last_crawled_link(category, link, Utc::now()),
            Err(_) => Err(StorageError::LockPoisoned),
        };

        if let Err(e) = result {
            tracing::error!(category, link, error = %e, "Failed to store last crawled link");
        }
    }
}

/// Moves to `next`, checking the transition in debug builds
fn advance(phase: &mut CrawlPhase, next: CrawlPhase) {
    debug_assert!(
        phase.can_transition_to(&next),
        "illegal crawl transition {} -> {}",
        phase,
        next
    );
    tracing::trace!(from = %phase, to = %next, "Crawl phase");
    *phase = next;
}

/// Splits page rows at the stored marker
///
/// Returns the rows before the first row whose link equals `marker`, and
/// whether such a row was found.
fn split_at_marker(mut rows: Vec<Post>, marker: Option<&str>) -> (Vec<Post>, bool) {
    let Some(marker) = marker else {
        return (rows, false);
    };

    match rows.iter().position(|post| post.link == marker) {
        Some(index) => {
            rows.truncate(index);
            (rows, true)
        }
        None => (rows, false),
    }
}
