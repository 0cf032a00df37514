use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{handlers, library, monitor};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Commands that change the library or spend catalog quota
    let admin_routes = Router::new()
        .route("/volumes", post(library::add_volume))
        .route("/volumes/{id}/download", post(library::download))
        .route("/monitor/check", post(monitor::check_now))
        .route("/reconnect", post(handlers::reconnect))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        // Health, config, status
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/status", get(handlers::get_status))
        .route("/metrics", get(handlers::metrics))
        // Catalog search through the library
        .route("/comics/search", get(library::search_comics))
        // Library browsing
        .route("/library", get(library::list_library))
        .route("/library/search", get(library::search_library))
        .route("/library/stats", get(library::library_stats))
        // Volumes
        .route("/volumes/{id}", get(library::get_volume))
        .route("/volumes/{id}/rename", get(library::rename_preview))
        .route("/volumes/{id}/manualsearch", get(library::manual_search))
        // Discovery
        .route("/monitor/recent", get(monitor::recent))
        .merge(admin_routes)
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
