//! Integration tests for building the lightbox membership cache

use content_audit::api::{ApiClient, PhotoApi};
use content_audit::cache::{
    fingerprint, CacheBuildSummary, LightboxCache, LightboxCacheBuilder, PresenceCache,
};
use content_audit::processor::ParallelExecutor;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn builder(uri: &str, cache_path: &Path) -> LightboxCacheBuilder {
    let client = Arc::new(ApiClient::new(uri, "test-token").unwrap());
    LightboxCacheBuilder::new(
        PhotoApi::new(client),
        ParallelExecutor::new(2, 10).unwrap(),
        cache_path.to_path_buf(),
    )
}

async fn mount_listing(server: &MockServer, offset: u64, total: u64, page: Value, expect: u64) {
    Mock::given(method("GET"))
        .and(path("/photo/api/v2/lightboxes"))
        .and(query_param("offset", offset.to_string()))
        .and(query_param("limit", "100"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-results-total", total.to_string().as_str())
                .set_body_json(page),
        )
        .expect(expect)
        .mount(server)
        .await;
}

async fn mount_photos(server: &MockServer, lightbox: &str, photos: &[&str], expect: u64) {
    let body: Vec<Value> = photos.iter().map(|id| json!({ "_id": id })).collect();
    Mock::given(method("GET"))
        .and(path(format!("/photo/api/v2/lightboxes/{lightbox}/photos")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expect)
        .mount(server)
        .await;
}

async fn run_build(uri: String, cache_path: PathBuf, start: Option<u64>) -> CacheBuildSummary {
    tokio::task::spawn_blocking(move || builder(&uri, &cache_path).build_all(start).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_build_walks_all_pages() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        0,
        150,
        json!([
            { "id": "L1", "last_photo_added": { "photo_id": "P2", "date": 1 } },
            { "id": "L2", "last_photo_added": null }
        ]),
        1,
    )
    .await;
    mount_listing(
        &server,
        100,
        150,
        json!([{ "id": "L3", "last_photo_added": { "photo_id": "P3", "date": 2 } }]),
        1,
    )
    .await;
    mount_photos(&server, "L1", &["P1", "P2"], 1).await;
    mount_photos(&server, "L2", &[], 1).await;
    mount_photos(&server, "L3", &["P3"], 1).await;

    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("acme_lightbox_photo_cache.json");
    let summary = run_build(server.uri(), cache_path.clone(), None).await;

    assert_eq!(summary.pages, 2);
    assert_eq!(summary.lightboxes_loaded, 3);
    assert_eq!(summary.photos_recorded, 3);
    assert_eq!(summary.empty_lightboxes, vec!["L2"]);
    assert!(summary.failed_lightboxes.is_empty());
    assert!(summary.complete);

    let cache = LightboxCache::load(&cache_path).unwrap();
    assert!(cache.is_complete());
    assert_eq!(cache.last_offset(), 0);
    assert_eq!(cache.lightboxes_of("P1"), vec!["L1"]);
    assert_eq!(cache.lightboxes_of("P3"), vec!["L3"]);
    assert_eq!(cache.lightbox_count(), 3);
    assert_eq!(cache.lightbox("L3").unwrap().offset, Some(100));
}

#[tokio::test]
async fn test_interrupted_build_resumes_from_saved_offset() {
    let server = MockServer::start().await;
    mount_listing(&server, 0, 150, json!([]), 0).await;
    mount_listing(
        &server,
        100,
        150,
        json!([{ "id": "L3", "last_photo_added": { "photo_id": "P3" } }]),
        1,
    )
    .await;
    mount_photos(&server, "L3", &["P3"], 1).await;

    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("cache.json");
    let mut partial = LightboxCache::new();
    partial.record_lightbox("L1", "abc".to_string(), Some(0), &["P1".to_string()]);
    partial.set_last_offset(100);
    partial.save(&cache_path).unwrap();

    let summary = run_build(server.uri(), cache_path.clone(), None).await;

    assert_eq!(summary.pages, 1);
    assert!(summary.complete);
    let cache = LightboxCache::load(&cache_path).unwrap();
    assert_eq!(cache.lightboxes_of("P1"), vec!["L1"]);
    assert_eq!(cache.lightboxes_of("P3"), vec!["L3"]);
}

#[tokio::test]
async fn test_unchanged_lightboxes_are_not_reloaded() {
    let last_added = json!({ "photo_id": "P1", "date": 1700000000000_i64 });
    let server = MockServer::start().await;
    mount_listing(
        &server,
        0,
        2,
        json!([
            { "id": "L1", "last_photo_added": last_added },
            { "id": "L2", "last_photo_added": { "photo_id": "P9" } }
        ]),
        1,
    )
    .await;
    mount_photos(&server, "L1", &["P1"], 0).await;
    mount_photos(&server, "L2", &["P9"], 1).await;

    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("cache.json");
    let mut cache = LightboxCache::new();
    cache.record_lightbox("L1", fingerprint(Some(&last_added)), Some(0), &["P1".to_string()]);
    cache.mark_complete();
    cache.save(&cache_path).unwrap();

    let summary = run_build(server.uri(), cache_path.clone(), Some(0)).await;

    assert_eq!(summary.lightboxes_unchanged, 1);
    assert_eq!(summary.lightboxes_loaded, 1);
    let cache = LightboxCache::load(&cache_path).unwrap();
    assert_eq!(cache.lightboxes_of("P1"), vec!["L1"]);
    assert_eq!(cache.lightboxes_of("P9"), vec!["L2"]);
}

#[tokio::test]
async fn test_first_listing_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photo/api/v2/lightboxes"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("cache.json");
    let (uri, path_clone) = (server.uri(), cache_path.clone());
    let result = tokio::task::spawn_blocking(move || builder(&uri, &path_clone).build_all(None))
        .await
        .unwrap();

    assert!(result.is_err());
    assert!(!cache_path.exists());
}

#[tokio::test]
async fn test_single_lightbox_build() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photo/api/v2/lightboxes/L7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "L7" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_photos(&server, "L7", &["P70", "P71"], 1).await;

    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("cache.json");
    let (uri, path_clone) = (server.uri(), cache_path.clone());
    let summary = tokio::task::spawn_blocking(move || builder(&uri, &path_clone).build_one("L7").unwrap())
        .await
        .unwrap();

    assert_eq!(summary.lightboxes_loaded, 1);
    assert_eq!(summary.photos_recorded, 2);

    let cache = LightboxCache::load(&cache_path).unwrap();
    assert_eq!(cache.lightboxes_of("P71"), vec!["L7"]);
    let entry = cache.lightbox("L7").unwrap();
    assert!(entry.fingerprint.is_empty());
    assert_eq!(entry.offset, None);
    assert!(!cache.is_complete());
}

#[tokio::test]
async fn test_photo_shared_by_unchanged_lightbox_survives_rebuild() {
    let server = MockServer::start().await;
    let first_page = json!([
        { "id": "LA", "last_photo_added": { "photo_id": "P", "date": 1 } },
        { "id": "LB", "last_photo_added": { "photo_id": "P", "date": 2 } }
    ]);
    mount_listing(&server, 0, 2, first_page, 1).await;
    mount_photos(&server, "LA", &["P"], 1).await;
    mount_photos(&server, "LB", &["P"], 1).await;

    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("acme_lightbox_photo_cache.json");
    run_build(server.uri(), cache_path.clone(), None).await;
    let cache = LightboxCache::load(&cache_path).unwrap();
    assert_eq!(cache.lightboxes_of("P"), vec!["LA", "LB"]);

    server.verify().await;
    server.reset().await;
    let second_page = json!([
        { "id": "LA", "last_photo_added": { "photo_id": "P", "date": 1 } },
        { "id": "LB", "last_photo_added": { "photo_id": "Q", "date": 3 } }
    ]);
    mount_listing(&server, 0, 2, second_page, 1).await;
    mount_photos(&server, "LA", &["P"], 0).await;
    mount_photos(&server, "LB", &["Q"], 1).await;

    let summary = run_build(server.uri(), cache_path.clone(), None).await;
    assert_eq!(summary.lightboxes_unchanged, 1);
    assert_eq!(summary.lightboxes_loaded, 1);

    let cache = LightboxCache::load(&cache_path).unwrap();
    assert!(cache.exists("P").unwrap());
    assert_eq!(cache.lightboxes_of("P"), vec!["LA"]);
    assert_eq!(cache.lightboxes_of("Q"), vec!["LB"]);
}
