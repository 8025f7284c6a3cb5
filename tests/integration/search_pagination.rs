//! Integration tests for paginated content search

use content_audit::api::{ApiClient, ApiError, ContentSearch};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUERY: &str = "type:redirect";

fn documents(from: usize, len: usize) -> Vec<Value> {
    (from..from + len)
        .map(|i| json!({ "_id": format!("doc-{i}"), "canonical_url": format!("/old/{i}") }))
        .collect()
}

async fn mount_page(server: &MockServer, from: u64, count: u64, docs: Vec<Value>, expect: u64) {
    Mock::given(method("GET"))
        .and(path("/content/v4/search"))
        .and(query_param("from", from.to_string()))
        .and(query_param("size", "100"))
        .and(query_param("website", "the-daily"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": count,
            "content_elements": docs
        })))
        .expect(expect)
        .mount(server)
        .await;
}

fn fetch_all(uri: String) -> Result<Vec<Value>, ApiError> {
    let client = Arc::new(ApiClient::new(uri, "test-token").unwrap());
    ContentSearch::new(client, "the-daily").fetch_all(QUERY, None)
}

#[tokio::test]
async fn test_stops_when_offset_reaches_count() {
    let server = MockServer::start().await;
    mount_page(&server, 0, 250, documents(0, 100), 1).await;
    mount_page(&server, 100, 250, documents(100, 100), 1).await;
    mount_page(&server, 200, 250, documents(200, 50), 1).await;
    mount_page(&server, 300, 250, Vec::new(), 0).await;

    let uri = server.uri();
    let docs = tokio::task::spawn_blocking(move || fetch_all(uri))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(docs.len(), 250);
    assert_eq!(docs[0]["_id"], "doc-0");
    assert_eq!(docs[249]["_id"], "doc-249");
}

#[tokio::test]
async fn test_stops_on_empty_page() {
    let server = MockServer::start().await;
    mount_page(&server, 0, 5_000, documents(0, 100), 1).await;
    mount_page(&server, 100, 5_000, Vec::new(), 1).await;
    mount_page(&server, 200, 5_000, documents(200, 100), 0).await;

    let uri = server.uri();
    let docs = tokio::task::spawn_blocking(move || fetch_all(uri))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(docs.len(), 100);
}

#[tokio::test]
async fn test_first_page_failure_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/v4/search"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let result = tokio::task::spawn_blocking(move || fetch_all(uri))
        .await
        .unwrap();

    match result {
        Err(ApiError::HttpError { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "unauthorized");
        }
        other => panic!("expected HttpError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_later_page_failure_keeps_fetched_documents() {
    let server = MockServer::start().await;
    mount_page(&server, 0, 300, documents(0, 100), 1).await;
    Mock::given(method("GET"))
        .and(path("/content/v4/search"))
        .and(query_param("from", "100"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let docs = tokio::task::spawn_blocking(move || fetch_all(uri))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(docs.len(), 100);
}

#[tokio::test]
async fn test_requests_carry_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/v4/search"))
        .and(wiremock::matchers::header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "content_elements": documents(0, 1)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let docs = tokio::task::spawn_blocking(move || fetch_all(uri))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(docs.len(), 1);
}

#[tokio::test]
async fn test_stops_at_result_window() {
    let server = MockServer::start().await;
    for page in 0..100u64 {
        let from = page * 100;
        mount_page(&server, from, 25_000, documents(from as usize, 100), 1).await;
    }
    mount_page(&server, 10_000, 25_000, documents(10_000, 100), 0).await;

    let uri = server.uri();
    let docs = tokio::task::spawn_blocking(move || fetch_all(uri))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(docs.len(), 10_000);
    assert_eq!(docs[9_999]["_id"], "doc-9999");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 100);
    assert!(requests
        .iter()
        .all(|request| !request.url.query().unwrap_or_default().contains("from=10000")));
}
