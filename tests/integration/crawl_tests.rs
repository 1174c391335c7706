//! Integration tests for the category crawl
//!
//! These tests use wiremock to serve paginated boards and check where a crawl
//! starts, where it stops and what it leaves in the state store.

use crate::common::*;
use bulletin_harvest::config::{BoardKind, CrawlerConfig};
use bulletin_harvest::crawler::{Coordinator, RegionTagger};
use bulletin_harvest::state::CrawlPhase;
use bulletin_harvest::storage::{SqliteStorage, StateStore};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn stored_link(coordinator: &Coordinator<SqliteStorage>, category: &str) -> Option<String> {
    coordinator
        .store()
        .lock()
        .unwrap()
        .get_last_crawled_link(category)
        .unwrap()
}

fn store_with_marker(category: &str, link: &str) -> SqliteStorage {
    let mut storage = SqliteStorage::new_in_memory().unwrap();
    storage
        .set_last_crawled_link(category, link, Utc::now())
        .unwrap();
    storage
}

#[tokio::test]
async fn test_first_run_collects_whole_page() {
    let server = MockServer::start().await;
    let rows = [row(4, "넷"), row(3, "셋"), row(2, "둘"), row(1, "하나")];
    mount_list(&server, 1, list_page(&rows, &[1, 2, 3], None), 1).await;
    mount_list(&server, 2, list_page(&[row(0, "다음")], &[1, 2, 3], None), 0).await;
    mount_details(&server, 1..=4).await;

    let coordinator = coordinator(SqliteStorage::new_in_memory().unwrap());
    let outcome = coordinator.run_category(&board(&server, "공지사항", 1)).await;

    let links: Vec<_> = outcome.posts.iter().map(|p| p.link.clone()).collect();
    assert_eq!(
        links,
        (1..=4).rev().map(|id| detail_link(&server, id)).collect::<Vec<_>>()
    );
    assert_eq!(outcome.phase, CrawlPhase::Exhausted(1));
    assert_eq!(outcome.total_pages, 3);
    assert_eq!(outcome.posts[0].content, "본문 4");
    assert_eq!(outcome.posts[0].department, "행정지원과");
}

#[tokio::test]
async fn test_stored_newest_link_yields_nothing() {
    let server = MockServer::start().await;
    let rows = [row(3, "셋"), row(2, "둘"), row(1, "하나")];
    mount_list(&server, 1, list_page(&rows, &[1, 2], None), 1).await;
    mount_list(&server, 2, list_page(&[row(0, "예전")], &[1, 2], None), 0).await;
    // Nothing after the marker is enriched
    Mock::given(method("GET"))
        .and(path("/board/view.do"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let newest = detail_link(&server, 3);
    let coordinator = coordinator(store_with_marker("공지사항", &newest));
    let outcome = coordinator.run_category(&board(&server, "공지사항", 5)).await;

    assert!(outcome.posts.is_empty());
    assert_eq!(outcome.phase, CrawlPhase::Stopped(1));
    assert_eq!(stored_link(&coordinator, "공지사항"), Some(newest));
}

#[tokio::test]
async fn test_stops_before_stored_link() {
    let server = MockServer::start().await;
    let rows = [
        row(5, "P1"),
        row(4, "P2"),
        row(3, "P3"),
        row(2, "P4"),
        row(1, "P5"),
    ];
    mount_list(&server, 1, list_page(&rows, &[1, 2, 3], None), 1).await;
    mount_list(&server, 2, list_page(&[row(0, "다음")], &[1, 2, 3], None), 0).await;
    mount_details(&server, [5, 4]).await;

    let coordinator = coordinator(store_with_marker("공지사항", &detail_link(&server, 3)));
    let outcome = coordinator.run_category(&board(&server, "공지사항", 3)).await;

    let titles: Vec<_> = outcome.posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["P1", "P2"]);
    assert_eq!(outcome.phase, CrawlPhase::Stopped(1));
    assert_eq!(outcome.pages_crawled, 1);
}

#[tokio::test]
async fn test_stored_link_on_later_page() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        1,
        list_page(&[row(6, "a"), row(5, "b")], &[1, 2, 3], None),
        1,
    )
    .await;
    mount_list(
        &server,
        2,
        list_page(&[row(4, "c"), row(3, "d")], &[1, 2, 3], None),
        1,
    )
    .await;
    mount_list(&server, 3, list_page(&[row(2, "e")], &[1, 2, 3], None), 0).await;
    mount_details(&server, [6, 5, 4]).await;

    let coordinator = coordinator(store_with_marker("공지사항", &detail_link(&server, 3)));
    let outcome = coordinator.run_category(&board(&server, "공지사항", 10)).await;

    let titles: Vec<_> = outcome.posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["a", "b", "c"]);
    assert_eq!(outcome.phase, CrawlPhase::Stopped(2));
    assert_eq!(stored_link(&coordinator, "공지사항"), Some(detail_link(&server, 6)));
}

#[tokio::test]
async fn test_page_count_is_clamped_to_limit() {
    let server = MockServer::start().await;
    for page in 1..=5u32 {
        let id = 100 - page;
        mount_list(
            &server,
            page,
            list_page(&[row(id, "글")], &[1, 2, 3], Some(10)),
            1,
        )
        .await;
        mount_detail(&server, id, "본문").await;
    }
    mount_list(&server, 6, list_page(&[row(1, "글")], &[1, 2, 3], Some(10)), 0).await;

    let coordinator = coordinator(SqliteStorage::new_in_memory().unwrap());
    let outcome = coordinator.run_category(&board(&server, "공지사항", 5)).await;

    assert_eq!(outcome.total_pages, 10);
    assert_eq!(outcome.pages_crawled, 5);
    assert_eq!(outcome.posts.len(), 5);
    assert_eq!(outcome.phase, CrawlPhase::Exhausted(5));
}

#[tokio::test]
async fn test_board_without_pagination_is_single_page() {
    let server = MockServer::start().await;
    mount_list(&server, 1, list_page(&[row(1, "유일")], &[], None), 1).await;
    mount_list(&server, 2, list_page(&[row(0, "없음")], &[], None), 0).await;
    mount_details(&server, [1]).await;

    let coordinator = coordinator(SqliteStorage::new_in_memory().unwrap());
    let outcome = coordinator.run_category(&board(&server, "공지사항", 10)).await;

    assert_eq!(outcome.total_pages, 1);
    assert_eq!(outcome.phase, CrawlPhase::Exhausted(1));
}

#[tokio::test]
async fn test_slow_detail_page_leaves_empty_content() {
    let server = MockServer::start().await;
    let rows = [
        row(5, "하나"),
        row(4, "둘"),
        row(3, "셋"),
        row(2, "넷"),
        row(1, "다섯"),
    ];
    mount_list(&server, 1, list_page(&rows, &[], None), 1).await;
    mount_details(&server, [5, 4, 2, 1]).await;
    mount_detail_response(
        &server,
        3,
        ResponseTemplate::new(200)
            .set_body_string(detail_page("늦은 본문"))
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let coordinator = Coordinator::new(
        fast_transport(),
        Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap())),
        Default::default(),
        &crawler_settings(Duration::from_millis(300)),
    );
    let outcome = coordinator.run_category(&board(&server, "공지사항", 1)).await;

    assert_eq!(outcome.posts.len(), 5);
    let contents: Vec<_> = outcome.posts.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(contents, ["본문 5", "본문 4", "", "본문 2", "본문 1"]);
    assert_eq!(outcome.phase, CrawlPhase::Exhausted(1));
}

#[tokio::test]
async fn test_failed_detail_page_leaves_empty_content() {
    let server = MockServer::start().await;
    mount_list(&server, 1, list_page(&[row(2, "a"), row(1, "b")], &[], None), 1).await;
    mount_details(&server, [2]).await;
    mount_detail_response(&server, 1, ResponseTemplate::new(404)).await;

    let coordinator = coordinator(SqliteStorage::new_in_memory().unwrap());
    let outcome = coordinator.run_category(&board(&server, "공지사항", 1)).await;

    assert_eq!(outcome.posts[0].content, "본문 2");
    assert_eq!(outcome.posts[1].content, "");
}

#[tokio::test]
async fn test_region_tags() {
    let server = MockServer::start().await;
    let rows = [
        row(3, "해미면 공지사항"),
        row(2, "주민 설명회"),
        row(1, "시정 소식"),
    ];
    mount_list(&server, 1, list_page(&rows, &[], None), 1).await;
    mount_detail(&server, 3, "행사 안내").await;
    mount_detail(&server, 2, "장소: 운산면 복지회관").await;
    mount_detail(&server, 1, "전 시민 대상").await;

    let coordinator = coordinator(SqliteStorage::new_in_memory().unwrap());
    let posts = coordinator.crawl_category(&board(&server, "공지사항", 1)).await;

    let regions: Vec<_> = posts.iter().map(|p| p.region.as_deref()).collect();
    assert_eq!(regions, [Some("해미면"), Some("운산면"), None]);
}

#[tokio::test]
async fn test_euc_kr_detail_page_is_decoded_and_tagged() {
    let server = MockServer::start().await;
    mount_list(&server, 1, list_page(&[row(1, "경로당 지원 안내")], &[], None), 1).await;

    let mut body = br#"<html><head><meta charset="euc-kr"></head><body><div id="bbs_content">"#.to_vec();
    body.extend_from_slice(&encoding_rs::EUC_KR.encode("해미면 경로당 냉방비 지원").0);
    body.extend_from_slice(b"</div></body></html>");
    mount_detail_response(&server, 1, ResponseTemplate::new(200).set_body_raw(body, "text/html")).await;

    let coordinator = coordinator(SqliteStorage::new_in_memory().unwrap());
    let posts = coordinator.crawl_category(&board(&server, "공지사항", 1)).await;

    assert_eq!(posts[0].content, "해미면 경로당 냉방비 지원");
    assert_eq!(posts[0].region.as_deref(), Some("해미면"));
}

#[tokio::test]
async fn test_detail_fetches_respect_concurrency_limit() {
    let server = MockServer::start().await;
    let rows: Vec<_> = (1..=6).rev().map(|id| row(id, "글")).collect();
    mount_list(&server, 1, list_page(&rows, &[], None), 1).await;
    for id in 1..=6 {
        mount_detail_response(
            &server,
            id,
            ResponseTemplate::new(200)
                .set_body_string(detail_page(&format!("본문 {}", id)))
                .set_delay(Duration::from_millis(300)),
        )
        .await;
    }

    let settings = crawler_settings(Duration::from_secs(5));
    let coordinator = Coordinator::new(
        fast_transport(),
        Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap())),
        RegionTagger::default(),
        &CrawlerConfig {
            detail_concurrency: 2,
            ..settings
        },
    );

    let started = Instant::now();
    let posts = coordinator.crawl_category(&board(&server, "공지사항", 1)).await;
    let elapsed = started.elapsed();

    // Six 300ms fetches, two at a time, need three rounds
    assert!(elapsed >= Duration::from_millis(900), "finished in {:?}", elapsed);
    let contents: Vec<_> = posts.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(contents, ["본문 6", "본문 5", "본문 4", "본문 3", "본문 2", "본문 1"]);
}

#[tokio::test]
async fn test_state_advances_to_newest_post() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        1,
        list_page(&[row(9, "new"), row(8, "old")], &[], None),
        1,
    )
    .await;
    mount_details(&server, [9, 8]).await;

    let coordinator = coordinator(SqliteStorage::new_in_memory().unwrap());
    assert_eq!(stored_link(&coordinator, "공지사항"), None);

    let posts = coordinator.crawl_category(&board(&server, "공지사항", 1)).await;
    assert_eq!(posts.len(), 2);
    assert_eq!(stored_link(&coordinator, "공지사항"), Some(posts[0].link.clone()));
}

#[tokio::test]
async fn test_second_run_is_empty() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        1,
        list_page(&[row(2, "a"), row(1, "b")], &[], None),
        2,
    )
    .await;
    mount_details(&server, [2, 1]).await;

    let coordinator = coordinator(SqliteStorage::new_in_memory().unwrap());
    let board = board(&server, "공지사항", 3);

    let first = coordinator.crawl_category(&board).await;
    let second = coordinator.run_category(&board).await;

    assert_eq!(first.len(), 2);
    assert!(second.posts.is_empty());
    assert_eq!(second.phase, CrawlPhase::Stopped(1));
    assert_eq!(stored_link(&coordinator, "공지사항"), Some(first[0].link.clone()));
}

#[tokio::test]
async fn test_list_failure_keeps_earlier_pages() {
    let server = MockServer::start().await;
    mount_list(&server, 1, list_page(&[row(4, "a"), row(3, "b")], &[1, 2, 3], None), 1).await;
    Mock::given(method("GET"))
        .and(path("/board/list.do"))
        .and(query_param("pageIndex", "2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_list(&server, 3, list_page(&[row(1, "c")], &[1, 2, 3], None), 0).await;
    mount_details(&server, [4, 3]).await;

    let coordinator = coordinator(SqliteStorage::new_in_memory().unwrap());
    let outcome = coordinator.run_category(&board(&server, "공지사항", 3)).await;

    assert_eq!(outcome.posts.len(), 2);
    assert_eq!(outcome.phase, CrawlPhase::Aborted(2));
    assert_eq!(outcome.pages_crawled, 1);
    assert_eq!(stored_link(&coordinator, "공지사항"), Some(detail_link(&server, 4)));
}

#[tokio::test]
async fn test_transient_list_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/board/list.do"))
        .and(query_param("pageIndex", "1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_list(&server, 1, list_page(&[row(1, "a")], &[], None), 1).await;
    mount_details(&server, [1]).await;

    let coordinator = coordinator(SqliteStorage::new_in_memory().unwrap());
    let outcome = coordinator.run_category(&board(&server, "공지사항", 1)).await;

    assert_eq!(outcome.posts.len(), 1);
    assert_eq!(outcome.phase, CrawlPhase::Exhausted(1));
}

#[tokio::test]
async fn test_unreachable_board_aborts_without_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let coordinator = coordinator(SqliteStorage::new_in_memory().unwrap());
    let outcome = coordinator.run_category(&board(&server, "공지사항", 3)).await;

    assert!(outcome.posts.is_empty());
    assert_eq!(outcome.phase, CrawlPhase::Aborted(1));
    assert_eq!(stored_link(&coordinator, "공지사항"), None);
}

#[tokio::test]
async fn test_welfare_board_rows() {
    let server = MockServer::start().await;
    let page = r#"<html><body><table><tbody>
            <tr><td>12</td><td><a href="/board/view.do?nttNo=12">경로당 지원</a></td>
                <td><img src="/img/file.gif" alt="첨부"></td><td>1,024</td><td>2024-04-30</td></tr>
            <tr><td>11</td><td><a href="/board/view.do?nttNo=11">노인 일자리</a></td>
                <td></td><td>7</td><td>2024-04-29</td></tr>
        </tbody></table></body></html>"#
        .to_string();
    mount_list(&server, 1, page, 1).await;
    mount_details(&server, [12, 11]).await;

    let coordinator = coordinator(SqliteStorage::new_in_memory().unwrap());
    let board = board(&server, "복지정보-어르신", 1);
    assert_eq!(board.kind, BoardKind::Welfare);
    let posts = coordinator.crawl_category(&board).await;

    assert_eq!(posts.len(), 2);
    assert!(posts[0].has_attachment);
    assert_eq!(posts[0].views, 1024);
    assert_eq!(posts[0].published_date, "2024-04-30");
    assert!(!posts[1].has_attachment);
    assert_eq!(posts[1].views, 7);
}
