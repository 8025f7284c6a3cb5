//! Integration tests for async URL status checks

use content_audit::status::{check_all_blocking, CheckStatus, StatusCheckConfig, StatusChecker};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(timeout: Duration) -> StatusCheckConfig {
    StatusCheckConfig {
        concurrency: 4,
        batch_size: 2,
        timeout,
    }
}

#[tokio::test]
async fn test_duplicate_urls_checked_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/live"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let checker = StatusChecker::new(&server.uri(), config(Duration::from_secs(5))).unwrap();
    let urls: Vec<String> = ["/live", "/gone", "/live", "/live", "/gone"]
        .iter()
        .map(|u| u.to_string())
        .collect();
    let statuses = checker.check_all(&urls).await;

    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses["/live"], CheckStatus::Code(200));
    assert_eq!(statuses["/gone"], CheckStatus::Code(404));
}

#[tokio::test]
async fn test_redirects_are_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/elsewhere"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let checker = StatusChecker::new(&server.uri(), config(Duration::from_secs(5))).unwrap();
    assert_eq!(checker.check_one("moved").await, CheckStatus::Code(301));
}

#[tokio::test]
async fn test_slow_url_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let checker = StatusChecker::new(&server.uri(), config(Duration::from_millis(200))).unwrap();
    assert_eq!(checker.check_one("/slow").await, CheckStatus::Timeout);
}

#[tokio::test]
async fn test_unreachable_host_is_error() {
    let checker = StatusChecker::new("http://127.0.0.1:1", config(Duration::from_secs(2))).unwrap();
    assert_eq!(checker.check_one("/anything").await, CheckStatus::Error);
}

#[tokio::test]
async fn test_blocking_entry_point() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let statuses = tokio::task::spawn_blocking(move || {
        let urls = vec!["/a".to_string(), "/a".to_string()];
        check_all_blocking(&uri, config(Duration::from_secs(5)), &urls)
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses["/a"], CheckStatus::Code(200));
}
