use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use longbox_core::scheduler::SchedulerStatus;
use longbox_core::{HealthSnapshot, SanitizedConfig, ServiceStatus};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::middleware::AdminCaller;
use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub services: ServiceStatus,
    pub checked_at: Option<DateTime<Utc>>,
    pub scheduler: Option<SchedulerStatus>,
    pub library_cache_size: usize,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /api/v1/status
///
/// Last known connectivity. Checks live if nothing has been recorded yet.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let known = state.health().read().await.clone();
    let snapshot = if known.checked_at.is_some() {
        known
    } else {
        record_check(&state).await
    };

    Json(status_response(&state, snapshot).await)
}

/// POST /api/v1/reconnect
///
/// Re-checks both services and drops the cached library ids so the next
/// discovery run sees a fresh listing.
pub async fn reconnect(
    State(state): State<Arc<AppState>>,
    AdminCaller(caller): AdminCaller,
) -> Json<StatusResponse> {
    info!("Reconnect requested by {}", caller.name);
    state.monitor().cache().invalidate().await;
    let snapshot = record_check(&state).await;
    info!(
        "Reconnect result: library={}, catalog={}",
        snapshot.services.library, snapshot.services.catalog
    );

    Json(status_response(&state, snapshot).await)
}

/// GET /api/v1/metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

async fn status_response(state: &AppState, snapshot: HealthSnapshot) -> StatusResponse {
    let scheduler = match state.scheduler() {
        Some(scheduler) => Some(scheduler.status().await),
        None => None,
    };
    StatusResponse {
        services: snapshot.services,
        checked_at: snapshot.checked_at,
        scheduler,
        library_cache_size: state.monitor().cache().len().await,
    }
}

async fn record_check(state: &AppState) -> HealthSnapshot {
    let services = state.monitor().check_services().await;
    let snapshot = HealthSnapshot {
        services,
        checked_at: Some(state.monitor().clock().now()),
    };
    *state.health().write().await = snapshot.clone();
    snapshot
}
