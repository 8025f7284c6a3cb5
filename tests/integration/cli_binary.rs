//! End-to-end tests of the `content-audit` binary

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn content_audit() -> Command {
    let mut cmd = Command::cargo_bin("content-audit").unwrap();
    cmd.env_remove("ARC_BEARER_TOKEN")
        .env_remove("CONTENT_AUDIT_API_BASE_URL")
        .env("RUST_LOG", "content_audit=warn");
    cmd
}

#[test]
fn test_help_lists_commands() {
    content_audit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("redirects"))
        .stdout(predicate::str::contains("wires"))
        .stdout(predicate::str::contains("photos"));
}

#[test]
fn test_missing_org_fails() {
    content_audit()
        .args(["redirects", "delete", "--redirect-url", "old", "--redirect-website", "the-daily"])
        .args(["--bearer-token", "secret", "--dry-run"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--org is required"));
}

#[test]
fn test_missing_token_fails() {
    content_audit()
        .args(["--org", "acme", "wires", "delete", "--arc-id", "S1", "--dry-run"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("bearer token"));
}

#[test]
fn test_invalid_worker_count_is_usage_error() {
    content_audit()
        .args(["--org", "acme", "--bearer-token", "secret"])
        .args(["wires", "delete", "--arc-id", "S1", "--max-workers", "0"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_dry_run_redirect_delete_prints_json() {
    let output = content_audit()
        .args(["--org", "acme", "--bearer-token", "secret", "--output-format", "json"])
        .args(["--api-base-url", "http://127.0.0.1:1"])
        .args(["redirects", "delete", "--redirect-url", "old-page", "--redirect-website", "the-daily"])
        .arg("--dry-run")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["command"], "redirects delete");
    assert_eq!(json["result"]["dry_run"], true);
    assert_eq!(json["result"]["statistics"]["succeeded"], 1);
    assert_eq!(json["result"]["statistics"]["api_calls"], 0);
    assert_eq!(json["result"]["results"][0]["identifier"], "the-daily:old-page");
}

#[test]
fn test_photo_delete_skips_preserved_ids() {
    let dir = TempDir::new().unwrap();
    let to_delete = dir.path().join("acme_photo_ids_to_delete_all_dates.csv");
    let preserved = dir.path().join("acme_preserved_photo_ids_all_dates.csv");
    fs::write(&to_delete, "P1\nP2\nP3\n").unwrap();
    fs::write(&preserved, "ans_id,ans_location,source_id,website\nP2,gallery,,the-daily\n").unwrap();

    let output = content_audit()
        .args(["--org", "acme", "--bearer-token", "secret", "--output-format", "json"])
        .args(["--api-base-url", "http://127.0.0.1:1"])
        .args(["photos", "delete", "--images-csv"])
        .arg(&to_delete)
        .arg("--dry-run")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["result"]["statistics"]["succeeded"], 2);
    assert_eq!(json["result"]["statistics"]["skipped"], 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wire_delete_against_mock_api() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/draft/v1/story/S1/revision/published"))
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

    let uri = server.uri();
    tokio::task::spawn_blocking(move || {
        content_audit()
            .args(["--org", "acme", "--bearer-token", "secret", "--api-base-url", &uri])
            .args(["wires", "delete", "--arc-id", "S1", "--settle-secs", "0"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Succeeded: 1"));
    })
    .await
    .unwrap();
}
