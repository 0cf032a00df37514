//! End-to-end tests with mocked external dependencies.
//!
//! These tests run the full router in-process with mock implementations of
//! the library and the catalog.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;

use longbox_core::library::RenameEntry;
use longbox_core::{HealthSnapshot, LibraryError, ServiceStatus};

use common::{fixtures, TestConfig, TestFixture, TEST_API_KEY};

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["auth"]["method"], "none");
    assert_eq!(response.body["library"]["api_key_configured"], true);
    assert_eq!(response.body["catalog"]["api_key_configured"], true);
    let text = response.body.to_string();
    assert!(!text.contains("library-key"));
    assert!(!text.contains("catalog-key"));
}

#[tokio::test]
async fn test_status_checks_live_when_nothing_recorded() {
    let fixture = TestFixture::new();
    fixture.catalog.set_connected(false).await;

    let response = fixture.get("/api/v1/status").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["services"]["library"], true);
    assert_eq!(response.body["services"]["catalog"], false);
    assert!(response.body["checked_at"].is_string());
    assert!(response.body["scheduler"].is_null());

    // the result is kept for later reads
    assert!(fixture.health.read().await.checked_at.is_some());
}

#[tokio::test]
async fn test_status_reports_last_known_snapshot() {
    let fixture = TestFixture::new();
    *fixture.health.write().await = HealthSnapshot {
        services: ServiceStatus {
            library: false,
            catalog: true,
        },
        checked_at: Some(Utc::now()),
    };

    let response = fixture.get("/api/v1/status").await;
    assert_eq!(response.body["services"]["library"], false);
    assert_eq!(response.body["services"]["catalog"], true);
    assert_eq!(fixture.library.call_count("about").await, 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/api/v1/health").await;

    let (status, text) = fixture.get_text("/api/v1/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("longbox_http_requests_total"));
    assert!(text.contains("longbox_scheduler_running"));
}

// =============================================================================
// Catalog Search
// =============================================================================

#[tokio::test]
async fn test_comic_search() {
    let fixture = TestFixture::new();
    let mut tracked = fixtures::library_search_result(4051, "Venom War");
    tracked.already_added = Some(12);
    fixture
        .library
        .set_search_results(vec![
            fixtures::library_search_result(4050, "Venom"),
            tracked,
            fixtures::library_search_result(4052, "Storm"),
        ])
        .await;

    let response = fixture.get("/api/v1/comics/search?query=venom").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 2);
    let results = response.body["results"].as_array().unwrap();
    assert_eq!(results[0]["catalog_id"], 4050);
    assert_eq!(
        results[0]["catalog_url"],
        "https://comicvine.gamespot.com/volume/4050-4050/"
    );
    assert!(results[0]["library_volume_id"].is_null());
    assert_eq!(results[1]["library_volume_id"], 12);

    let limited = fixture.get("/api/v1/comics/search?query=venom&limit=1").await;
    assert_eq!(limited.body["count"], 1);
}

#[tokio::test]
async fn test_comic_search_requires_query() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/comics/search?query=%20").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "query is required");
    assert_eq!(fixture.library.call_count("search").await, 0);
}

// =============================================================================
// Library Browsing
// =============================================================================

async fn seed_library(fixture: &TestFixture) {
    let mut complete = fixtures::library_volume(2, 4060, "Absolute Batman");
    complete.issues_downloaded = complete.issue_count;
    let mut unmonitored = fixtures::library_volume(3, 4070, "Venom War");
    unmonitored.monitored = false;

    fixture
        .library
        .insert_volume(fixtures::library_volume(1, 4050, "Venom"))
        .await;
    fixture.library.insert_volume(complete).await;
    fixture.library.insert_volume(unmonitored).await;
}

#[tokio::test]
async fn test_library_list_and_filters() {
    let fixture = TestFixture::new();
    seed_library(&fixture).await;

    let all = fixture.get("/api/v1/library").await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["count"], 3);
    assert_eq!(all.body["volumes"][0]["title"], "Absolute Batman");

    let wanted = fixture.get("/api/v1/library?filter=wanted").await;
    assert_eq!(wanted.body["count"], 1);
    assert_eq!(wanted.body["volumes"][0]["title"], "Venom");

    let bad = fixture.get("/api/v1/library?filter=everything").await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert!(bad.body["error"].as_str().unwrap().contains("everything"));
}

#[tokio::test]
async fn test_library_search() {
    let fixture = TestFixture::new();
    seed_library(&fixture).await;

    let response = fixture.get("/api/v1/library/search?query=VENOM").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 2);
}

#[tokio::test]
async fn test_library_stats() {
    let fixture = TestFixture::new();
    seed_library(&fixture).await;

    let response = fixture.get("/api/v1/library/stats").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["volumes"], 3);
    assert_eq!(response.body["issues"], 18);
    assert_eq!(response.body["downloaded_issues"], 10);
    assert_eq!(response.body["unmonitored"], 1);
    let percent = response.body["completion_percent"].as_f64().unwrap();
    assert!((percent - 55.555).abs() < 0.01);
}

#[tokio::test]
async fn test_library_unreachable_is_503() {
    let fixture = TestFixture::new();
    fixture
        .library
        .set_next_error(LibraryError::Connection("connection refused".into()))
        .await;

    let response = fixture.get("/api/v1/library/stats").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["error"], "Library service unavailable");
}

// =============================================================================
// Volumes
// =============================================================================

#[tokio::test]
async fn test_get_volume() {
    let fixture = TestFixture::new();
    seed_library(&fixture).await;

    let response = fixture.get("/api/v1/volumes/1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Venom");
    assert_eq!(response.body["display_title"], "Venom (2026)");
    assert_eq!(
        response.body["cover_url"],
        "http://mock-library/api/volumes/1/cover"
    );
    assert_eq!(
        response.body["catalog_url"],
        "https://comicvine.gamespot.com/volume/4050-4050/"
    );

    let missing = fixture.get("/api/v1/volumes/99").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error"], "Volume 99 not found");
}

#[tokio::test]
async fn test_rename_preview_and_manual_search() {
    let fixture = TestFixture::new();
    seed_library(&fixture).await;
    fixture
        .library
        .set_rename_preview(
            1,
            vec![RenameEntry {
                before: "/comics/venom 1.cbz".to_string(),
                after: "/comics/Venom (2026)/Venom (2026) Volume 01 Issue 001.cbz".to_string(),
            }],
        )
        .await;
    fixture
        .library
        .set_download_options(
            1,
            vec![
                fixtures::download_option("Venom #1", "https://getcomics.org/venom-1", true),
                fixtures::download_option("Venom #1 Variant", "https://getcomics.org/v", false),
            ],
        )
        .await;

    let renames = fixture.get("/api/v1/volumes/1/rename").await;
    assert_eq!(renames.status, StatusCode::OK);
    assert_eq!(renames.body["count"], 1);
    assert_eq!(renames.body["renames"][0]["before"], "/comics/venom 1.cbz");

    let options = fixture.get("/api/v1/volumes/1/manualsearch").await;
    assert_eq!(options.status, StatusCode::OK);
    assert_eq!(options.body["count"], 2);
    assert_eq!(options.body["options"][0]["match"], true);
}

#[tokio::test]
async fn test_add_volume_outcomes() {
    let fixture = TestFixture::new();
    fixture
        .library
        .reject_add(777, "Volume not found on ComicVine")
        .await;

    let added = fixture
        .post("/api/v1/volumes", json!({"catalog_id": 4050, "title": "Venom"}))
        .await;
    assert_eq!(added.status, StatusCode::CREATED);
    assert_eq!(added.body["catalog_id"], 4050);
    assert_eq!(added.body["volume_id"], 1000);
    assert_eq!(fixture.monitor.cache().len().await, 1);
    let status = fixture.get("/api/v1/status").await;
    assert_eq!(status.body["library_cache_size"], 1);

    let duplicate = fixture
        .post("/api/v1/volumes", json!({"catalog_id": 4050}))
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert!(duplicate.body["error"]
        .as_str()
        .unwrap()
        .contains("already in the library"));

    let rejected = fixture
        .post("/api/v1/volumes", json!({"catalog_id": 777}))
        .await;
    assert_eq!(rejected.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(rejected.body["error"], "Volume not found on ComicVine");

    let invalid = fixture.post("/api/v1/volumes", json!({"catalog_id": 0})).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_release() {
    let fixture = TestFixture::new();
    seed_library(&fixture).await;

    let response = fixture
        .post(
            "/api/v1/volumes/1/download",
            json!({"link": "https://getcomics.org/venom-1", "force_match": true}),
        )
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);

    let downloads = fixture.library.downloads().await;
    assert_eq!(downloads.len(), 1);
    assert_eq!(downloads[0].volume_id, 1);
    assert!(downloads[0].force_match);

    let unknown = fixture
        .post("/api/v1/volumes/99/download", json!({"link": "https://x"}))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let blank = fixture
        .post("/api/v1/volumes/1/download", json!({"link": "  "}))
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Discovery
// =============================================================================

#[tokio::test]
async fn test_manual_check_adds_new_series() {
    let fixture = TestFixture::new();
    fixture
        .library
        .insert_volume(fixtures::library_volume(1, 201, "Venom War"))
        .await;
    fixture
        .catalog
        .set_publisher_results(
            31,
            vec![
                fixtures::marvel_volume(201, "Venom War"),
                fixtures::marvel_volume(202, "Storm"),
            ],
        )
        .await;

    let response = fixture
        .post("/api/v1/monitor/check", json!({"days_back": 14}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["days_back"], 14);
    assert_eq!(response.body["checked"], 2);
    assert_eq!(response.body["already_exists"], 1);
    assert_eq!(response.body["added_successfully"], 1);
    assert_eq!(
        response.body["summary"],
        "checked 2, new 1, added 1, failed 0, already present 1"
    );
    assert_eq!(fixture.library.volume_count().await, 2);
}

#[tokio::test]
async fn test_manual_check_defaults_days_back() {
    let fixture = TestFixture::new();
    let response = fixture.post("/api/v1/monitor/check", json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["days_back"], 7);
    assert_eq!(response.body["checked"], 0);
}

#[tokio::test]
async fn test_manual_check_rejects_out_of_range_days() {
    let fixture = TestFixture::new();
    for days in [0, 61] {
        let response = fixture
            .post("/api/v1/monitor/check", json!({ "days_back": days }))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "days_back must be between 1 and 60");
    }
    assert!(fixture.catalog.queries().await.is_empty());
}

#[tokio::test]
async fn test_manual_check_with_catalog_down() {
    let fixture = TestFixture::new();
    fixture.catalog.set_connected(false).await;

    let response = fixture
        .post("/api/v1/monitor/check", json!({"days_back": 7}))
        .await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["error"], "Catalog service unavailable");
    assert!(fixture.library.added_volumes().await.is_empty());
}

#[tokio::test]
async fn test_recent_additions() {
    let fixture = TestFixture::new();
    fixture
        .library
        .insert_volume(fixtures::library_volume(1, 301, "Blade"))
        .await;
    fixture
        .catalog
        .set_publisher_results(
            31,
            vec![
                fixtures::marvel_volume(301, "Blade"),
                fixtures::marvel_volume(302, "Moon Knight"),
            ],
        )
        .await;

    let response = fixture.get("/api/v1/monitor/recent?days=3").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["days_back"], 3);
    assert_eq!(response.body["count"], 2);
    assert_eq!(response.body["additions"][0]["in_library"], true);
    assert_eq!(response.body["additions"][1]["in_library"], false);
    // browsing never adds anything
    assert!(fixture.library.added_volumes().await.is_empty());

    let bad = fixture.get("/api/v1/monitor/recent?days=90").await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recent_additions_with_catalog_down() {
    let fixture = TestFixture::new();
    fixture.catalog.set_connected(false).await;

    let response = fixture.get("/api/v1/monitor/recent").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_reconnect_refreshes_status() {
    let fixture = TestFixture::new();
    let first = fixture.get("/api/v1/status").await;
    assert_eq!(first.body["services"]["catalog"], true);

    fixture.catalog.set_connected(false).await;
    let response = fixture.post("/api/v1/reconnect", json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["services"]["library"], true);
    assert_eq!(response.body["services"]["catalog"], false);

    let after = fixture.get("/api/v1/status").await;
    assert_eq!(after.body["services"]["catalog"], false);
}

#[tokio::test]
async fn test_reconnect_clears_library_cache() {
    let fixture = TestFixture::new();
    fixture.monitor.cache().insert(4050).await;
    let before = fixture.get("/api/v1/status").await;
    assert_eq!(before.body["library_cache_size"], 1);

    let response = fixture.post("/api/v1/reconnect", json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["library_cache_size"], 0);
}

// =============================================================================
// Admin Auth
// =============================================================================

#[tokio::test]
async fn test_admin_routes_require_key() {
    let fixture = TestFixture::with_config(TestConfig {
        require_api_key: true,
    });

    let denied = fixture
        .post("/api/v1/volumes", json!({"catalog_id": 4050}))
        .await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);
    assert_eq!(denied.body["error"], "Authentication required");
    assert!(fixture.library.added_volumes().await.is_empty());

    let wrong = fixture
        .post_with_key("/api/v1/reconnect", json!({}), Some("nope"))
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let allowed = fixture
        .post_with_key(
            "/api/v1/volumes",
            json!({"catalog_id": 4050}),
            Some(TEST_API_KEY),
        )
        .await;
    assert_eq!(allowed.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_read_routes_stay_open_with_api_key_auth() {
    let fixture = TestFixture::with_config(TestConfig {
        require_api_key: true,
    });
    seed_library(&fixture).await;

    assert_eq!(fixture.get("/api/v1/library").await.status, StatusCode::OK);
    assert_eq!(fixture.get("/api/v1/volumes/1").await.status, StatusCode::OK);
    assert_eq!(fixture.get("/api/v1/config").await.body["auth"]["method"], "api_key");
}
