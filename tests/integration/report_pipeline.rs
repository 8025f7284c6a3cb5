//! End-to-end report tests: split, fetch, status check, export

use content_audit::api::{ApiClient, ArcEnvironment, ContentSearch};
use content_audit::range::DateRange;
use content_audit::report::{
    RedirectReport, ReportPipeline, ReportSummary, StatusCheckRequest, WireReport,
};
use content_audit::status::StatusCheckConfig;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(uri: &str) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(uri, "test-token").unwrap())
}

async fn mount_search(server: &MockServer, size: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/content/v4/search"))
        .and(query_param("size", size))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_redirect_report_with_status_check() {
    let api = MockServer::start().await;
    let site = MockServer::start().await;

    mount_search(&api, "1", json!({ "count": 3, "content_elements": [] })).await;
    mount_search(
        &api,
        "100",
        json!({
            "count": 3,
            "content_elements": [
                { "_id": "R1", "canonical_url": "/old-1", "redirect_url": "/new-1", "created_date": "2020-01-02T10:00:00Z" },
                { "_id": "R2", "canonical_url": "/old-2", "redirect_url": "/new-2", "created_date": "2020-01-03T10:00:00Z" },
                { "_id": "R3", "canonical_url": "/old-1", "redirect_url": "/new-3", "created_date": "2020-01-04T10:00:00Z" }
            ]
        }),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/old-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/old-2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("redirects.csv");
    let (api_uri, site_uri, output_path) = (api.uri(), site.uri(), output.clone());

    let summary: ReportSummary = tokio::task::spawn_blocking(move || {
        let source = RedirectReport::new(
            ContentSearch::new(client(&api_uri), "the-daily"),
            ArcEnvironment::Production,
        );
        let window = DateRange::parse("2020-01-01", "2020-01-31").unwrap();
        ReportPipeline::new()
            .with_workers(2)
            .with_status_check(StatusCheckRequest {
                domain: site_uri,
                config: StatusCheckConfig {
                    concurrency: 4,
                    batch_size: 10,
                    timeout: Duration::from_secs(5),
                },
            })
            .run(&source, Some(&window), &output_path)
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(summary.rows, 3);
    assert_eq!(summary.ranges, 1);
    assert_eq!(summary.failed_ranges, 0);
    assert!(summary.status_checked);
    assert_eq!(summary.output_path, Some(output.clone()));

    let text = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "identifier,canonical_url,redirect_url,created_date,website,environment,check_404_or_200"
    );
    assert_eq!(lines.len(), 4);
    assert!(text.contains("R1,/old-1,/new-1,2020-01-02T10:00:00Z,the-daily,production,200"));
    assert!(text.contains("R2,/old-2,/new-2,2020-01-03T10:00:00Z,the-daily,production,404"));
    assert!(text.contains("R3,/old-1,/new-3,2020-01-04T10:00:00Z,the-daily,production,200"));
}

#[tokio::test]
async fn test_wire_report_exports_extra_fields() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/v4/search"))
        .and(query_param(
            "q",
            "type:story AND revision.published:false AND source.name:AP AND source.source_type:wires",
        ))
        .and(query_param(
            "_sourceInclude",
            "_id,source.name,created_date,revision.published,additional_properties.has_published_copy,distributor.name",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "content_elements": [{
                "_id": "W1",
                "source": { "name": "AP" },
                "created_date": "2024-01-01T00:00:00Z",
                "additional_properties": { "has_published_copy": false },
                "distributor": { "name": "Associated Press" }
            }]
        })))
        .expect(1)
        .mount(&api)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("wires.csv");
    let (api_uri, output_path) = (api.uri(), output.clone());

    let summary = tokio::task::spawn_blocking(move || {
        let source = WireReport::new(
            ContentSearch::new(client(&api_uri), "the-daily"),
            ArcEnvironment::Sandbox,
        )
        .with_extra_filters("AND source.name:AP")
        .with_extra_fields(vec!["distributor.name".to_string(), " distributor.name ".to_string()]);
        ReportPipeline::new().run(&source, None, &output_path).unwrap()
    })
    .await
    .unwrap();

    assert_eq!(summary.rows, 1);
    assert_eq!(summary.ranges, 0);
    assert!(!summary.status_checked);

    let text = fs::read_to_string(&output).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "ans_id,source_name,source_system,published_copy,created_date,website,environment,distributor.name"
    );
    assert_eq!(
        lines.next().unwrap(),
        "W1,AP,,false,2024-01-01T00:00:00Z,the-daily,sandbox,Associated Press"
    );
}

#[tokio::test]
async fn test_empty_report_writes_no_file() {
    let api = MockServer::start().await;
    mount_search(&api, "1", json!({ "count": 0, "content_elements": [] })).await;
    mount_search(&api, "100", json!({ "count": 0, "content_elements": [] })).await;

    let dir = TempDir::new().unwrap();
    let output: PathBuf = dir.path().join("empty.csv");
    let (api_uri, output_path) = (api.uri(), output.clone());

    let summary = tokio::task::spawn_blocking(move || {
        let source = RedirectReport::new(
            ContentSearch::new(client(&api_uri), "the-daily"),
            ArcEnvironment::Production,
        );
        let window = DateRange::parse("2020-01-01", "2020-01-31").unwrap();
        ReportPipeline::new()
            .run(&source, Some(&window), &output_path)
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(summary.rows, 0);
    assert!(summary.output_path.is_none());
    assert!(!output.exists());
}
