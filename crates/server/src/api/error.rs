//! Error bodies shared by every handler.

use axum::{http::StatusCode, Json};
use longbox_core::LibraryError;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, message)
}

pub fn not_found(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::NOT_FOUND, message)
}

pub fn service_unavailable(service: &str) -> ApiError {
    api_error(
        StatusCode::SERVICE_UNAVAILABLE,
        format!("{} service unavailable", service),
    )
}

/// Map a failed library call onto a response.
///
/// Transport failures mean the service is unreachable (503); anything the
/// library answered but we could not use is a bad gateway.
pub fn library_error(e: LibraryError) -> ApiError {
    warn!("Library request failed: {}", e);
    match e {
        LibraryError::Timeout(_) | LibraryError::Connection(_) | LibraryError::NotConfigured(_) => {
            service_unavailable("Library")
        }
        LibraryError::NotFound(what) | LibraryError::Api { status: 404, message: what } => {
            not_found(what)
        }
        LibraryError::Api { status, message } => api_error(
            StatusCode::BAD_GATEWAY,
            format!("Library returned {}: {}", status, message),
        ),
        LibraryError::Parse(message) => api_error(
            StatusCode::BAD_GATEWAY,
            format!("Unreadable library response: {}", message),
        ),
    }
}

/// Lookback window from a request, defaulting to the configured one.
pub fn days_back_param(requested: Option<i64>, default: u32) -> Result<u32, ApiError> {
    use longbox_core::config::{MAX_DAYS_BACK, MIN_DAYS_BACK};

    let days = requested.unwrap_or(i64::from(default));
    if days < i64::from(MIN_DAYS_BACK) || days > i64::from(MAX_DAYS_BACK) {
        return Err(bad_request(format!(
            "days_back must be between {} and {}",
            MIN_DAYS_BACK, MAX_DAYS_BACK
        )));
    }
    Ok(days as u32)
}
