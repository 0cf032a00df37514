//! Library browsing and volume commands.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use longbox_core::catalog::catalog_volume_url;
use longbox_core::library::{
    AddOutcome, AddVolumeRequest, DownloadOption, LibrarySearchResult, LibraryStats,
    LibraryVolume, RenameEntry, VolumeFilter,
};

use super::error::{api_error, bad_request, library_error, not_found, ApiError};
use super::middleware::AdminCaller;
use crate::state::AppState;

/// Default result count for catalog searches.
const DEFAULT_SEARCH_LIMIT: usize = 50;
const MAX_SEARCH_LIMIT: usize = 100;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryListParams {
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddVolumeBody {
    pub catalog_id: u64,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadBody {
    pub link: String,
    #[serde(default)]
    pub force_match: bool,
}

#[derive(Debug, Serialize)]
pub struct ComicSearchHit {
    pub catalog_id: Option<u64>,
    pub title: String,
    pub year: Option<i64>,
    pub publisher: String,
    pub issue_count: u64,
    pub description: String,
    pub cover_url: Option<String>,
    pub catalog_url: Option<String>,
    /// Library volume id when the series is already tracked.
    pub library_volume_id: Option<u64>,
}

impl From<LibrarySearchResult> for ComicSearchHit {
    fn from(hit: LibrarySearchResult) -> Self {
        let catalog_id = hit.catalog_id();
        Self {
            catalog_id,
            cover_url: hit.cover_url(),
            catalog_url: catalog_id.map(catalog_volume_url),
            library_volume_id: hit.already_added,
            title: hit.title,
            year: hit.year,
            publisher: hit.publisher,
            issue_count: hit.issue_count,
            description: hit.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ComicSearchResponse {
    pub query: String,
    pub results: Vec<ComicSearchHit>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct VolumeListResponse {
    pub volumes: Vec<LibraryVolume>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: LibraryStats,
    pub completion_percent: f64,
}

#[derive(Debug, Serialize)]
pub struct VolumeDetailResponse {
    #[serde(flatten)]
    pub volume: LibraryVolume,
    pub display_title: String,
    pub cover_url: String,
    pub catalog_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RenamePreviewResponse {
    pub volume_id: u64,
    pub renames: Vec<RenameEntry>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ManualSearchResponse {
    pub volume_id: u64,
    pub options: Vec<DownloadOption>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct AddVolumeResponse {
    pub catalog_id: u64,
    pub volume_id: u64,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub volume_id: u64,
    pub link: String,
    pub force_match: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/comics/search
///
/// Catalog search proxied through the library.
pub async fn search_comics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ComicSearchResponse>, ApiError> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(bad_request("query is required"));
    }
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let results: Vec<ComicSearchHit> = state
        .library()
        .search(query, limit)
        .await
        .map_err(library_error)?
        .into_iter()
        .map(ComicSearchHit::from)
        .collect();

    Ok(Json(ComicSearchResponse {
        query: query.to_string(),
        count: results.len(),
        results,
    }))
}

/// GET /api/v1/library
///
/// Every tracked volume, optionally only `wanted` or `monitored` ones.
pub async fn list_library(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LibraryListParams>,
) -> Result<Json<VolumeListResponse>, ApiError> {
    let filter = match params.filter.as_deref().map(str::trim) {
        None | Some("") => None,
        Some("wanted") => Some(VolumeFilter::Wanted),
        Some("monitored") => Some(VolumeFilter::Monitored),
        Some(other) => {
            return Err(bad_request(format!(
                "unknown filter '{}', expected 'wanted' or 'monitored'",
                other
            )))
        }
    };

    let volumes = state
        .library()
        .list_volumes(filter)
        .await
        .map_err(library_error)?;
    Ok(Json(VolumeListResponse {
        count: volumes.len(),
        volumes,
    }))
}

/// GET /api/v1/library/search
pub async fn search_library(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<VolumeListResponse>, ApiError> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(bad_request("query is required"));
    }

    let volumes = state
        .library()
        .search_library(query)
        .await
        .map_err(library_error)?;
    Ok(Json(VolumeListResponse {
        count: volumes.len(),
        volumes,
    }))
}

/// GET /api/v1/library/stats
pub async fn library_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.library().stats().await.map_err(library_error)?;
    Ok(Json(StatsResponse {
        completion_percent: stats.completion_percent(),
        stats,
    }))
}

/// GET /api/v1/volumes/{id}
pub async fn get_volume(
    State(state): State<Arc<AppState>>,
    Path(volume_id): Path<u64>,
) -> Result<Json<VolumeDetailResponse>, ApiError> {
    let library = state.library();
    let volume = library
        .get_volume(volume_id)
        .await
        .map_err(library_error)?
        .ok_or_else(|| not_found(format!("Volume {} not found", volume_id)))?;

    Ok(Json(VolumeDetailResponse {
        display_title: volume.display_title(),
        cover_url: library.cover_url(volume_id),
        catalog_url: volume.catalog_id().map(catalog_volume_url),
        volume,
    }))
}

/// GET /api/v1/volumes/{id}/rename
///
/// Planned renames; nothing is changed on disk.
pub async fn rename_preview(
    State(state): State<Arc<AppState>>,
    Path(volume_id): Path<u64>,
) -> Result<Json<RenamePreviewResponse>, ApiError> {
    let renames = state
        .library()
        .rename_preview(volume_id)
        .await
        .map_err(library_error)?;
    Ok(Json(RenamePreviewResponse {
        volume_id,
        count: renames.len(),
        renames,
    }))
}

/// GET /api/v1/volumes/{id}/manualsearch
pub async fn manual_search(
    State(state): State<Arc<AppState>>,
    Path(volume_id): Path<u64>,
) -> Result<Json<ManualSearchResponse>, ApiError> {
    let options = state
        .library()
        .manual_search(volume_id)
        .await
        .map_err(library_error)?;
    Ok(Json(ManualSearchResponse {
        volume_id,
        count: options.len(),
        options,
    }))
}

/// POST /api/v1/volumes
///
/// Start tracking a catalog volume. A duplicate answers 409, a refusal 422.
pub async fn add_volume(
    State(state): State<Arc<AppState>>,
    AdminCaller(caller): AdminCaller,
    Json(body): Json<AddVolumeBody>,
) -> Result<(StatusCode, Json<AddVolumeResponse>), ApiError> {
    if body.catalog_id == 0 {
        return Err(bad_request("catalog_id must be a positive integer"));
    }
    let title = body
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| format!("catalog volume {}", body.catalog_id));
    info!("{} is adding {} ({})", caller.name, title, body.catalog_id);

    let request = AddVolumeRequest {
        catalog_id: body.catalog_id,
        title,
    };
    let outcome = state
        .library()
        .add_volume(&request)
        .await
        .map_err(library_error)?;

    match outcome {
        AddOutcome::Added { volume_id } => {
            state.monitor().cache().insert(body.catalog_id).await;
            Ok((
                StatusCode::CREATED,
                Json(AddVolumeResponse {
                    catalog_id: body.catalog_id,
                    volume_id,
                }),
            ))
        }
        AddOutcome::AlreadyExists { .. } => {
            state.monitor().cache().insert(body.catalog_id).await;
            Err(api_error(
                StatusCode::CONFLICT,
                format!("{} is already in the library", request.title),
            ))
        }
        AddOutcome::Rejected { reason } => {
            Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, reason))
        }
    }
}

/// POST /api/v1/volumes/{id}/download
///
/// Queue one manual-search result for download.
pub async fn download(
    State(state): State<Arc<AppState>>,
    AdminCaller(caller): AdminCaller,
    Path(volume_id): Path<u64>,
    Json(body): Json<DownloadBody>,
) -> Result<(StatusCode, Json<DownloadResponse>), ApiError> {
    let link = body.link.trim();
    if link.is_empty() {
        return Err(bad_request("link is required"));
    }
    info!(
        "{} queued a download for volume {} (force_match={})",
        caller.name, volume_id, body.force_match
    );

    state
        .library()
        .download(volume_id, link, body.force_match)
        .await
        .map_err(library_error)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DownloadResponse {
            volume_id,
            link: link.to_string(),
            force_match: body.force_match,
        }),
    ))
}
