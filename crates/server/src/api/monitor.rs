//! On-demand discovery runs.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use longbox_core::{DiscoveryRunResult, RecentAddition};

use super::error::{days_back_param, service_unavailable, ApiError};
use super::middleware::AdminCaller;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub days_back: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    #[serde(default)]
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub days_back: u32,
    #[serde(flatten)]
    pub result: DiscoveryRunResult,
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct RecentResponse {
    pub days_back: u32,
    pub additions: Vec<RecentAddition>,
    pub count: usize,
}

/// POST /api/v1/monitor/check
///
/// Run discovery and acquisition now. Both services must be reachable.
pub async fn check_now(
    State(state): State<Arc<AppState>>,
    AdminCaller(caller): AdminCaller,
    body: Option<Json<CheckRequest>>,
) -> Result<Json<CheckResponse>, ApiError> {
    let Json(request) = body.unwrap_or_default();
    let days_back = days_back_param(request.days_back, state.config().monitor.days_back)?;

    let services = state.monitor().check_services().await;
    if !services.catalog {
        warn!("Manual check refused: catalog unreachable");
        return Err(service_unavailable("Catalog"));
    }
    if !services.library {
        warn!("Manual check refused: library unreachable");
        return Err(service_unavailable("Library"));
    }

    info!("{} started a manual check over {} days", caller.name, days_back);
    let result = state.monitor().check_and_add_new_comics(days_back).await;
    Ok(Json(CheckResponse {
        days_back,
        summary: result.summary(),
        result,
    }))
}

/// GET /api/v1/monitor/recent
///
/// Recently started series and whether the library has them.
pub async fn recent(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentParams>,
) -> Result<Json<RecentResponse>, ApiError> {
    let days_back = days_back_param(params.days, state.config().monitor.days_back)?;

    if !state.monitor().catalog().check_connection().await {
        return Err(service_unavailable("Catalog"));
    }

    let additions = state.monitor().recent_additions(days_back).await;
    Ok(Json(RecentResponse {
        days_back,
        count: additions.len(),
        additions,
    }))
}
