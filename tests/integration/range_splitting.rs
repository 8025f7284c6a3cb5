//! Integration tests for hit-probe driven range splitting against a mock search API

use content_audit::api::{ApiClient, ArcEnvironment, ContentSearch};
use content_audit::range::{DateRange, ProbeFailurePolicy, RangeSplitter};
use content_audit::report::{RedirectReport, ReportPipeline};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FULL: &str = "type:redirect AND created_date:[2020-01-01T00:00:00 TO 2020-01-31T00:00:00]";
const LEFT: &str = "type:redirect AND created_date:[2020-01-01T00:00:00 TO 2020-01-16T00:00:00]";
const RIGHT: &str = "type:redirect AND created_date:[2020-01-16T00:00:00 TO 2020-01-31T00:00:00]";

async fn mount_probe(server: &MockServer, query: &str, count: u64) {
    Mock::given(method("GET"))
        .and(path("/content/v4/search"))
        .and(query_param("q", query))
        .and(query_param("size", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": count,
            "content_elements": []
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn build_ranges(uri: String, splitter: RangeSplitter) -> Vec<DateRange> {
    let client = Arc::new(ApiClient::new(uri, "test-token").unwrap());
    let source = RedirectReport::new(
        ContentSearch::new(client, "the-daily"),
        ArcEnvironment::Production,
    );
    let window = DateRange::parse("2020-01-01", "2020-01-31").unwrap();
    ReportPipeline::new()
        .with_splitter(splitter)
        .build_ranges(&source, Some(&window))
}

#[tokio::test]
async fn test_over_ceiling_window_splits_at_midpoint() {
    let server = MockServer::start().await;
    mount_probe(&server, FULL, 20_000).await;
    mount_probe(&server, LEFT, 8_000).await;
    mount_probe(&server, RIGHT, 8_000).await;

    let uri = server.uri();
    let ranges = tokio::task::spawn_blocking(move || build_ranges(uri, RangeSplitter::new()))
        .await
        .unwrap();

    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[0].start_str(), "2020-01-01T00:00:00");
    assert_eq!(ranges[0].end_str(), "2020-01-16T00:00:00");
    assert_eq!(ranges[1].start_str(), "2020-01-16T00:00:00");
    assert_eq!(ranges[1].end_str(), "2020-01-31T00:00:00");
}

#[tokio::test]
async fn test_under_ceiling_window_probed_once() {
    let server = MockServer::start().await;
    mount_probe(&server, FULL, 10_000).await;

    let uri = server.uri();
    let ranges = tokio::task::spawn_blocking(move || build_ranges(uri, RangeSplitter::new()))
        .await
        .unwrap();

    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0], DateRange::parse("2020-01-01", "2020-01-31").unwrap());
}

#[tokio::test]
async fn test_failed_probe_fails_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/v4/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let ranges = tokio::task::spawn_blocking(move || build_ranges(uri, RangeSplitter::new()))
        .await
        .unwrap();

    assert_eq!(ranges.len(), 1);
}

#[tokio::test]
async fn test_failed_probe_can_force_split() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/v4/search"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let splitter = RangeSplitter::new()
        .with_max_depth(1)
        .with_failure_policy(ProbeFailurePolicy::ForceSplit);
    let ranges = tokio::task::spawn_blocking(move || build_ranges(uri, splitter))
        .await
        .unwrap();

    // Depth 1: the root is probed and split, the halves are kept without probing.
    assert_eq!(ranges.len(), 2);
}
