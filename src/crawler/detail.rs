//! Detail page enrichment
//!
//! Detail pages of one list page are fetched concurrently through the shared
//! transport, each under its own deadline. A failed or late fetch leaves that
//! post's content empty and never affects its siblings.

use crate::crawler::Transport;
use crate::model::Post;
use crate::HarvestError;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tokio::time::timeout;

/// Content containers, most specific first
static CONTENT_CANDIDATES: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "#bbs_content",
        ".bbs_content",
        "td.bbs_content",
        ".bbs_view .view_cont",
        ".board_view .view_cont",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("static selector"))
    .collect()
});

/// Extracts the body text of a detail page
///
/// Returns `None` when no candidate container is present.
pub fn extract_content(document: &Html) -> Option<String> {
    let container = CONTENT_CANDIDATES
        .iter()
        .find_map(|selector| document.select(selector).next())?;

    Some(container_text(container))
}

/// Visible text of a container: comments and script/style bodies dropped,
/// whitespace collapsed
fn container_text(container: ElementRef) -> String {
    let mut words: Vec<&str> = Vec::new();

    for node in container.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |el| matches!(el.name(), "script" | "style"))
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }

    words.join(" ")
}

fn content_from_body(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    extract_content(&document)
}

/// Fetches one detail page and extracts its content
///
/// The deadline covers the whole fetch, retries included. A page without a
/// content container yields an empty string.
pub async fn fetch_detail_content(
    transport: &Transport,
    url: &str,
    deadline: Duration,
) -> crate::Result<String> {
    let body = match timeout(deadline, transport.fetch(url)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(HarvestError::DetailTimeout {
                url: url.to_string(),
                timeout_ms: deadline.as_millis() as u64,
            })
        }
    };

    match content_from_body(&body) {
        Some(content) => Ok(content),
        None => {
            tracing::debug!(url, "No content container on detail page");
            Ok(String::new())
        }
    }
}

/// Fills `content` of every post from its detail page
///
/// At most `concurrency` fetches are in flight. Results are written back by
/// position, so row order is kept whatever the completion order.
///
/// Returns the number of posts left with empty content.
pub async fn enrich_posts(
    transport: &Transport,
    posts: &mut [Post],
    concurrency: usize,
    deadline: Duration,
) -> usize {
    let jobs: Vec<(usize, String)> = posts
        .iter()
        .enumerate()
        .map(|(index, post)| (index, post.link.clone()))
        .collect();

    let results: Vec<(usize, String)> = stream::iter(jobs)
        .map(|(index, link)| async move {
            let content = match fetch_detail_content(transport, &link, deadline).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(url = %link, error = %e, "Detail fetch failed; keeping empty content");
                    String::new()
                }
            };
            (index, content)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    for (index, content) in results {
        posts[index].content = content;
    }

    posts.iter().filter(|p| p.content.is_empty()).count()
}
