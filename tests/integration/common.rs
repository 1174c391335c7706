//! Shared fixtures for the integration tests
//!
//! Boards are served by a wiremock server under `/board/list.do?pageIndex=N`
//! with detail pages under `/board/view.do?nttNo=N`.

use bulletin_harvest::config::{BoardConfig, CrawlerConfig, TransportConfig};
use bulletin_harvest::crawler::{Coordinator, RegionTagger, RetryPolicy, Transport};
use bulletin_harvest::storage::StateStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One list row: post number and title
pub struct Row<'a> {
    pub id: u32,
    pub title: &'a str,
}

pub fn row(id: u32, title: &str) -> Row<'_> {
    Row { id, title }
}

/// Renders a standard list page
///
/// `anchors` are the numbered pagination links, `last` the "jump to last" target.
pub fn list_page(rows: &[Row], anchors: &[u32], last: Option<u32>) -> String {
    let body: String = rows
        .iter()
        .map(|r| {
            format!(
                r#"<tr><td>{id}</td><td class="subject"><a href="/board/view.do?nttNo={id}">{title}</a></td><td>행정지원과</td><td>2024.05.{day:02}</td></tr>"#,
                id = r.id,
                title = r.title,
                day = (r.id % 28) + 1
            )
        })
        .collect();

    let numbered: String = anchors
        .iter()
        .map(|n| format!(r#"<a href="?bbsNo=1&amp;pageIndex={n}">{n}</a>"#, n = n))
        .collect();
    let jump = last
        .map(|n| format!(r#"<a class="next_end" href="?bbsNo=1&amp;pageIndex={}">끝</a>"#, n))
        .unwrap_or_default();

    format!(
        r#"<html><body>
        <table class="bbs_list"><thead><tr><th>번호</th><th>제목</th><th>부서</th><th>등록일</th></tr></thead>
        <tbody>{}</tbody></table>
        <div class="pagination"><span class="page_wrap">{}</span>{}</div>
        </body></html>"#,
        body, numbered, jump
    )
}

pub fn detail_page(content: &str) -> String {
    format!(
        r#"<html><body><div class="bbs_view"><div id="bbs_content"><!-- body -->{}</div></div></body></html>"#,
        content
    )
}

pub fn list_prefix(server: &MockServer) -> String {
    format!("{}/board/list.do?bbsNo=1&pageIndex=", server.uri())
}

pub fn detail_link(server: &MockServer, id: u32) -> String {
    format!("{}/board/view.do?nttNo={}", server.uri(), id)
}

/// Mounts list page `page`, expecting exactly `times` requests for it
pub async fn mount_list(server: &MockServer, page: u32, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path("/board/list.do"))
        .and(query_param("pageIndex", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Mounts a detail page returning `content` inside the usual container
pub async fn mount_detail(server: &MockServer, id: u32, content: &str) {
    mount_detail_response(
        server,
        id,
        ResponseTemplate::new(200).set_body_string(detail_page(content)),
    )
    .await;
}

pub async fn mount_detail_response(server: &MockServer, id: u32, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/board/view.do"))
        .and(query_param("nttNo", id.to_string()))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Mounts detail pages for `ids`, each with content `"본문 {id}"`
pub async fn mount_details(server: &MockServer, ids: impl IntoIterator<Item = u32>) {
    for id in ids {
        mount_detail(server, id, &format!("본문 {}", id)).await;
    }
}

pub fn fast_transport() -> Transport {
    let config = TransportConfig {
        request_timeout_ms: 5_000,
        connect_timeout_ms: 1_000,
        max_attempts: 3,
        base_backoff_ms: 10,
        max_backoff_ms: 20,
        ..TransportConfig::default()
    };
    let policy = RetryPolicy {
        max_jitter_ms: 0,
        ..RetryPolicy::from_config(&config)
    };
    Transport::new(&config)
        .expect("transport builds")
        .with_policy(policy)
}

pub fn crawler_settings(detail_timeout: Duration) -> CrawlerConfig {
    CrawlerConfig {
        detail_concurrency: 5,
        detail_timeout_ms: detail_timeout.as_millis() as u64,
        ..CrawlerConfig::default()
    }
}

pub fn coordinator<S: StateStore>(store: S) -> Coordinator<S> {
    Coordinator::new(
        fast_transport(),
        Arc::new(Mutex::new(store)),
        RegionTagger::default(),
        &crawler_settings(Duration::from_secs(2)),
    )
}

pub fn board(server: &MockServer, category: &str, limit: u32) -> BoardConfig {
    BoardConfig::new(category, &list_prefix(server), limit)
}
