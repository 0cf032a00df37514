//! Common test utilities for E2E testing with mocks.
//!
//! Builds the full router in-process with mock upstream services, so the
//! command surface can be driven without a library or catalog running.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use longbox_core::config::{AuthConfig, AuthMethod};
use longbox_core::testing::{MockCatalog, MockClock, MockLibrary, MockNotifier};
use longbox_core::{create_authenticator, ComicMonitor, Config, SharedHealth};
use longbox_server::state::AppState;

/// Re-export fixtures for test convenience
pub use longbox_core::testing::fixtures;

/// API key used when a fixture is built with auth enabled.
pub const TEST_API_KEY: &str = "test-admin-key";

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new();
/// fixture.library.insert_volume(fixtures::library_volume(7, 4050, "Venom")).await;
///
/// let response = fixture.get("/api/v1/volumes/7").await;
/// assert_eq!(response.status, StatusCode::OK);
/// ```
pub struct TestFixture {
    pub router: Router,
    pub library: Arc<MockLibrary>,
    pub catalog: Arc<MockCatalog>,
    pub notifier: Arc<MockNotifier>,
    pub clock: Arc<MockClock>,
    pub monitor: Arc<ComicMonitor>,
    pub health: SharedHealth,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Debug, Default)]
pub struct TestConfig {
    /// Guard admin routes with [`TEST_API_KEY`].
    pub require_api_key: bool,
}

impl TestFixture {
    /// Create a new test fixture with open auth.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    pub fn with_config(test_config: TestConfig) -> Self {
        let auth = if test_config.require_api_key {
            AuthConfig {
                method: AuthMethod::ApiKey,
                api_key: Some(TEST_API_KEY.to_string()),
            }
        } else {
            AuthConfig {
                method: AuthMethod::None,
                api_key: None,
            }
        };
        let config = Config {
            auth,
            ..fixtures::config()
        };

        let library = Arc::new(MockLibrary::new());
        let catalog = Arc::new(MockCatalog::new());
        let notifier = Arc::new(MockNotifier::new());
        let clock = Arc::new(MockClock::default());
        let monitor = Arc::new(ComicMonitor::new(
            catalog.clone(),
            library.clone(),
            notifier.clone(),
            clock.clone(),
            &config,
        ));
        let health = SharedHealth::default();

        let authenticator = Arc::from(
            create_authenticator(&config.auth).expect("Failed to create authenticator"),
        );
        let state = Arc::new(AppState::new(
            config,
            authenticator,
            Arc::clone(&monitor),
            Arc::clone(&health),
            None,
        ));

        Self {
            router: longbox_server::api::create_router(state),
            library,
            catalog,
            notifier,
            clock,
            monitor,
            health,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.post_with_key(uri, body, None).await
    }

    pub async fn post_with_key(&self, uri: &str, body: Value, key: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = key {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }
        let request = builder
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Raw body text, for non-JSON endpoints.
    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse { status, body }
    }
}
