//! Integration tests for the batch driver
//!
//! A config file pointing at a wiremock server is loaded from disk, the batch
//! runs against an on-disk database, and the reports are written next to it.

use crate::common::*;
use bulletin_harvest::config::{load_config_with_hash, select_boards, Config};
use bulletin_harvest::crawler::{run_batch, Coordinator};
use bulletin_harvest::output::write_reports;
use bulletin_harvest::state::Termination;
use bulletin_harvest::storage::{open_storage, PostSink, RunHistory, SqliteStorage, StateStore};
use bulletin_harvest::ConfigError;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    dir: TempDir,
    config: Config,
    config_hash: String,
}

/// Writes a config with a notice board and a welfare board served by `server`
fn harness(server: &MockServer) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("harvest.db");
    let report_path = dir.path().join("out").join("output.json");
    let summary_path = dir.path().join("out").join("summary.md");

    let toml = format!(
        r#"
[crawler]
max-pages = 3
detail-concurrency = 4
detail-timeout-ms = 2000

[transport]
max-attempts = 1

[output]
database-path = "{db}"
report-path = "{report}"
summary-path = "{summary}"

[[board]]
category-name = "공지사항"
list-url-prefix = "{base}/board/list.do?bbsNo=1&pageIndex="

[[board]]
category-name = "복지정보-어르신"
list-url-prefix = "{base}/welfare/list.do?pageIndex="
pages-to-crawl = 1
"#,
        db = db_path.display(),
        report = report_path.display(),
        summary = summary_path.display(),
        base = server.uri()
    );

    let config_path = dir.path().join("harvest.toml");
    std::fs::write(&config_path, toml).unwrap();
    let (config, config_hash) = load_config_with_hash(&config_path).unwrap();

    Harness {
        dir,
        config,
        config_hash,
    }
}

async fn mount_welfare(server: &MockServer) {
    let page = r#"<html><body><table><tbody>
        <tr><td>2</td><td><a href="/board/view.do?nttNo=902">해미면 경로당 지원</a></td>
            <td><img src="/file.gif"></td><td>15</td><td>2024.04.30</td></tr>
    </tbody></table></body></html>"#;
    Mock::given(method("GET"))
        .and(path("/welfare/list.do"))
        .and(query_param("pageIndex", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(server)
        .await;
    mount_detail(server, 902, "경로당 냉방비를 지원합니다").await;
}

fn coordinator_for(h: &Harness) -> Coordinator<SqliteStorage> {
    let storage = open_storage(Path::new(&h.config.output.database_path)).unwrap();
    Coordinator::from_config(&h.config, Arc::new(Mutex::new(storage))).unwrap()
}

#[tokio::test]
async fn test_batch_persists_and_reports() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        1,
        list_page(&[row(3, "c"), row(2, "b")], &[1, 2], None),
        1,
    )
    .await;
    mount_list(&server, 2, list_page(&[row(1, "a")], &[1, 2], None), 1).await;
    mount_details(&server, 1..=3).await;
    mount_welfare(&server).await;

    let h = harness(&server);
    let boards = select_boards(&h.config, None).unwrap();
    let coordinator = coordinator_for(&h);

    let report = run_batch(&coordinator, &boards, &h.config_hash, 2).await;

    assert_eq!(report.categories.len(), 2);
    assert_eq!(report.categories[0].category, "공지사항");
    assert_eq!(report.categories[0].post_count(), 3);
    assert_eq!(report.categories[0].termination, Termination::Exhausted);
    assert_eq!(report.categories[1].category, "복지정보-어르신");
    assert_eq!(report.categories[1].posts[0].region.as_deref(), Some("해미면"));
    assert!(report.categories[1].posts[0].has_attachment);
    assert_eq!(report.total_accepted(), 4);

    {
        let storage = coordinator.store().lock().unwrap();
        assert_eq!(storage.count_total_posts().unwrap(), 4);
        let welfare = storage.load_posts("복지정보-어르신").unwrap();
        assert_eq!(welfare[0].content, "경로당 냉방비를 지원합니다");

        let run = storage
            .get_run(report.categories[0].run_id.unwrap())
            .unwrap();
        assert_eq!(run.termination, Some(Termination::Exhausted));
        assert_eq!(run.pages_crawled, 2);
        assert_eq!(run.accepted_posts, 3);
        assert_eq!(run.config_hash, h.config_hash);
    }

    assert_eq!(write_reports(&report, &h.config.output).unwrap(), 2);
    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(h.dir.path().join("out").join("output.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["공지사항"]["post_count"], 3);
    assert_eq!(json["복지정보-어르신"]["posts"][0]["region"], "해미면");
    let summary = std::fs::read_to_string(h.dir.path().join("out").join("summary.md")).unwrap();
    assert!(summary.contains("| 공지사항 | 3 | 3 |"));
}

#[tokio::test]
async fn test_second_batch_finds_nothing_new() {
    let server = MockServer::start().await;
    mount_list(&server, 1, list_page(&[row(2, "b"), row(1, "a")], &[], None), 2).await;
    mount_details(&server, 1..=2).await;

    let h = harness(&server);
    let boards = select_boards(&h.config, Some("공지사항")).unwrap();
    let coordinator = coordinator_for(&h);

    let first = run_batch(&coordinator, &boards, &h.config_hash, 1).await;
    let second = run_batch(&coordinator, &boards, &h.config_hash, 1).await;

    assert_eq!(first.total_new_posts(), 2);
    assert_eq!(second.total_new_posts(), 0);
    assert_eq!(second.categories[0].termination, Termination::Stopped);

    let runs = coordinator.store().lock().unwrap().recent_runs(10).unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].new_posts, 0);
}

#[tokio::test]
async fn test_state_survives_reopening_the_database() {
    let server = MockServer::start().await;
    mount_list(&server, 1, list_page(&[row(2, "b"), row(1, "a")], &[], None), 2).await;
    mount_details(&server, 1..=2).await;

    let h = harness(&server);
    let boards = select_boards(&h.config, Some("공지사항")).unwrap();

    {
        let coordinator = coordinator_for(&h);
        run_batch(&coordinator, &boards, &h.config_hash, 1).await;
    }

    let coordinator = coordinator_for(&h);
    let report = run_batch(&coordinator, &boards, &h.config_hash, 1).await;
    assert_eq!(report.total_new_posts(), 0);
}

#[tokio::test]
async fn test_reset_state_recrawls_but_stores_no_duplicates() {
    let server = MockServer::start().await;
    mount_list(&server, 1, list_page(&[row(2, "b"), row(1, "a")], &[], None), 2).await;
    mount_details(&server, 1..=2).await;

    let h = harness(&server);
    let boards = select_boards(&h.config, Some("공지사항")).unwrap();
    let coordinator = coordinator_for(&h);

    run_batch(&coordinator, &boards, &h.config_hash, 1).await;
    let cleared = coordinator.store().lock().unwrap().reset_crawl_state().unwrap();
    assert_eq!(cleared, 1);

    let again = run_batch(&coordinator, &boards, &h.config_hash, 1).await;
    assert_eq!(again.total_new_posts(), 2);
    assert_eq!(again.total_accepted(), 0);
    assert_eq!(again.categories[0].persisted.duplicates, 2);
}

#[tokio::test]
async fn test_failing_board_does_not_stop_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/board/list.do"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_welfare(&server).await;

    let h = harness(&server);
    let boards = select_boards(&h.config, None).unwrap();
    let coordinator = coordinator_for(&h);

    let report = run_batch(&coordinator, &boards, &h.config_hash, 1).await;

    assert_eq!(report.categories[0].termination, Termination::Aborted);
    assert_eq!(report.categories[0].post_count(), 0);
    assert_eq!(report.categories[1].post_count(), 1);
    assert_eq!(report.aborted_categories().count(), 1);
}

#[tokio::test]
async fn test_unknown_category_lists_available() {
    let server = MockServer::start().await;
    let h = harness(&server);

    match select_boards(&h.config, Some("행사소식")) {
        Err(ConfigError::UnknownCategory { name, available }) => {
            assert_eq!(name, "행사소식");
            assert_eq!(available, ["공지사항", "복지정보-어르신"]);
        }
        other => panic!("expected UnknownCategory, got {:?}", other),
    }
}
