//! Authentication and metrics middleware for API routes.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use longbox_core::{AuthError, Caller, Credentials};
use tracing::warn;

use super::error::api_error;
use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Metrics middleware that tracks HTTP request duration and counts.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Guards admin routes with the configured authenticator.
///
/// On success the [`Caller`] is stored in the request extensions for
/// [`AdminCaller`]. Failures answer 401 with an `{error}` body.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let credentials = Credentials::from_pairs(
        request
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v))),
    );

    match state.authenticator().authenticate(&credentials).await {
        Ok(caller) => {
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(e @ AuthError::MissingCredentials) => {
            AUTH_FAILURES_TOTAL.with_label_values(&["missing"]).inc();
            api_error(StatusCode::UNAUTHORIZED, e.to_string()).into_response()
        }
        Err(e @ AuthError::InvalidCredentials) => {
            AUTH_FAILURES_TOTAL.with_label_values(&["invalid"]).inc();
            warn!("Rejected admin request to {}", request.uri().path());
            api_error(StatusCode::UNAUTHORIZED, e.to_string()).into_response()
        }
        Err(e) => {
            AUTH_FAILURES_TOTAL.with_label_values(&["internal_error"]).inc();
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Extractor for the caller behind an admin request.
///
/// Falls back to the anonymous caller when no identity was stored, which
/// only happens on routes outside the auth layer.
#[derive(Debug, Clone)]
pub struct AdminCaller(pub Caller);

impl<S> FromRequestParts<S> for AdminCaller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let caller = parts
            .extensions
            .get::<Caller>()
            .cloned()
            .unwrap_or_else(Caller::anonymous);
        std::future::ready(Ok(AdminCaller(caller)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
        middleware,
        routing::get,
        Router,
    };
    use http_body_util::BodyExt;
    use longbox_core::config::{AuthConfig, AuthMethod};
    use longbox_core::testing::{fixtures, MockCatalog, MockClock, MockLibrary, MockNotifier};
    use longbox_core::{create_authenticator, ComicMonitor, Config};
    use tower::ServiceExt;

    async fn caller_name(AdminCaller(caller): AdminCaller) -> String {
        caller.name
    }

    fn create_test_state(auth: AuthConfig) -> Arc<AppState> {
        let config = Config {
            auth,
            ..fixtures::config()
        };
        let monitor = Arc::new(ComicMonitor::new(
            Arc::new(MockCatalog::new()),
            Arc::new(MockLibrary::new()),
            Arc::new(MockNotifier::new()),
            Arc::new(MockClock::default()),
            &config,
        ));
        let authenticator = Arc::from(create_authenticator(&config.auth).unwrap());
        Arc::new(AppState::new(
            config,
            authenticator,
            monitor,
            Default::default(),
            None,
        ))
    }

    fn keyed() -> AuthConfig {
        AuthConfig {
            method: AuthMethod::ApiKey,
            api_key: Some("secret-key".to_string()),
        }
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/test", get(caller_name))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_open_auth_allows_all() {
        let state = create_test_state(AuthConfig {
            method: AuthMethod::None,
            api_key: None,
        });
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_bearer_key_accepted() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer secret-key")
            .body(Body::empty())
            .unwrap();

        let response = app(create_test_state(keyed())).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_ne!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_x_api_key_header() {
        let request = Request::builder()
            .uri("/test")
            .header("X-API-Key", "secret-key")
            .body(Body::empty())
            .unwrap();

        let response = app(create_test_state(keyed())).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_key_rejected_with_error_body() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer wrong-key")
            .body(Body::empty())
            .unwrap();

        let response = app(create_test_state(keyed())).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"], "Invalid API key");
    }

    #[tokio::test]
    async fn test_missing_key_rejected() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app(create_test_state(keyed())).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
