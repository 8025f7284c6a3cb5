//! Integration tests for bulk removal against a mock draft and photo API

use content_audit::api::{ApiClient, DraftApi, PhotoApi};
use content_audit::cleanup::actions::EXPIRATION_DATE;
use content_audit::cleanup::{
    run_cleanup, CleanupReport, PhotoRemoval, RedirectDeletion, RedirectTarget, RemovalMode,
    StoryDeletion,
};
use content_audit::processor::{ParallelExecutor, RunStatistics, WorkAction, WorkStatus};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(uri: &str) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(uri, "test-token").unwrap())
}

fn executor() -> ParallelExecutor {
    ParallelExecutor::new(2, 10).unwrap()
}

fn targets(urls: &[&str]) -> Vec<RedirectTarget> {
    urls.iter()
        .map(|url| RedirectTarget {
            url: url.to_string(),
            website: "the-daily".to_string(),
        })
        .collect()
}

fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[tokio::test]
async fn test_redirect_delete_counts_successes_and_failures() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/draft/v1/redirect/the-daily/old-page"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/draft/v1/redirect/the-daily/missing-page"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such redirect"))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let report: CleanupReport = tokio::task::spawn_blocking(move || {
        let action = RedirectDeletion::new(DraftApi::new(client(&uri)));
        let statistics = RunStatistics::new();
        run_cleanup(
            &action,
            &targets(&["old-page", "missing-page"]),
            &executor(),
            false,
            &statistics,
        )
    })
    .await
    .unwrap();

    assert!(!report.dry_run);
    assert_eq!(report.statistics.processed, 2);
    assert_eq!(report.statistics.succeeded, 1);
    assert_eq!(report.statistics.failed, 1);
    assert_eq!(report.statistics.api_calls, 2);

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].identifier, "the-daily:missing-page");
    assert_eq!(failures[0].status, WorkStatus::Failed);
    assert_eq!(failures[0].response_code, Some(404));
    assert_eq!(failures[0].error.as_deref(), Some("no such redirect"));
}

#[tokio::test]
async fn test_dry_run_issues_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let uri = server.uri();
    let report = tokio::task::spawn_blocking(move || {
        let action = RedirectDeletion::new(DraftApi::new(client(&uri)));
        run_cleanup(
            &action,
            &targets(&["a", "b", "c"]),
            &executor(),
            true,
            &RunStatistics::new(),
        )
    })
    .await
    .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.statistics.succeeded, 3);
    assert_eq!(report.statistics.api_calls, 0);
    assert!(report
        .results
        .iter()
        .all(|r| r.status == WorkStatus::Done && r.response_code == Some(200)));
}

#[tokio::test]
async fn test_story_delete_tolerates_unpublish_failure() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/draft/v1/story/S1/revision/published"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/draft/v1/story/S2/revision/published"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/draft/v1/story/S1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/draft/v1/story/S2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let report = tokio::task::spawn_blocking(move || {
        let action = StoryDeletion::new(DraftApi::new(client(&uri))).with_settle(Duration::ZERO);
        run_cleanup(&action, &ids(&["S1", "S2"]), &executor(), false, &RunStatistics::new())
    })
    .await
    .unwrap();

    assert_eq!(report.statistics.succeeded, 2);
    assert_eq!(report.statistics.failed, 0);
    assert_eq!(report.statistics.api_calls, 4);
    assert!(report.results.iter().all(|r| r.action == WorkAction::Delete));
}

#[tokio::test]
async fn test_photo_expire_puts_expired_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photo/api/v2/photos/P1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "P1",
            "subtitle": "harbour at dawn",
            "additional_properties": { "published": true, "originalName": "dawn.jpg" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/photo/api/v2/photos/P1/"))
        .and(body_partial_json(json!({
            "_id": "P1",
            "subtitle": "harbour at dawn",
            "additional_properties": {
                "published": false,
                "expiration_date": EXPIRATION_DATE,
                "originalName": "dawn.jpg"
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let report = tokio::task::spawn_blocking(move || {
        let action = PhotoRemoval::new(PhotoApi::new(client(&uri)), RemovalMode::Expire);
        run_cleanup(&action, &ids(&["P1"]), &executor(), false, &RunStatistics::new())
    })
    .await
    .unwrap();

    assert_eq!(report.statistics.succeeded, 1);
    assert_eq!(report.results[0].action, WorkAction::Expire);
    assert_eq!(report.statistics.api_calls, 2);
}

#[tokio::test]
async fn test_photo_expire_missing_photo_is_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photo/api/v2/photos/P404/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let uri = server.uri();
    let report = tokio::task::spawn_blocking(move || {
        let action = PhotoRemoval::new(PhotoApi::new(client(&uri)), RemovalMode::Expire);
        run_cleanup(&action, &ids(&["P404"]), &executor(), false, &RunStatistics::new())
    })
    .await
    .unwrap();

    assert_eq!(report.statistics.failed, 1);
    assert_eq!(report.results[0].status, WorkStatus::Failed);
    assert_eq!(report.results[0].response_code, Some(404));
}

#[tokio::test]
async fn test_photo_hard_delete() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/photo/api/v2/photos/P1/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/photo/api/v2/photos/P2/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let report = tokio::task::spawn_blocking(move || {
        let action = PhotoRemoval::new(PhotoApi::new(client(&uri)), RemovalMode::HardDelete);
        run_cleanup(&action, &ids(&["P1", "P2"]), &executor(), false, &RunStatistics::new())
    })
    .await
    .unwrap();

    assert_eq!(report.statistics.succeeded, 1);
    assert_eq!(report.statistics.failed, 1);
    let failed = report.failures().next().unwrap();
    assert_eq!(failed.identifier, "P2");
    assert_eq!(failed.action, WorkAction::Delete);
    assert_eq!(failed.response_code, Some(500));
}
