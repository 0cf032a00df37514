//! Prometheus metrics for the HTTP surface.
//!
//! The registry also carries every collector from `longbox_core::metrics`, so
//! `/api/v1/metrics` exposes discovery, queue and upstream-service series too.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "longbox_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("longbox_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "longbox_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures on admin routes.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "longbox_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Service Status (collected on scrape)
// =============================================================================

/// Last known reachability per upstream service (1 = up).
pub static SERVICE_UP: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("longbox_service_up", "Upstream service reachability"),
        &["service"],
    )
    .unwrap()
});

/// Whether the background scheduler is running.
pub static SCHEDULER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "longbox_scheduler_running",
        "Whether the background scheduler is running (1 = yes)",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Status
    registry.register(Box::new(SERVICE_UP.clone())).unwrap();
    registry
        .register(Box::new(SCHEDULER_RUNNING.clone()))
        .unwrap();

    // Core metrics (discovery, acquisition, queue, external services)
    for metric in longbox_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Refresh gauges derived from application state before a scrape.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let snapshot = state.health().read().await.clone();
    if snapshot.checked_at.is_some() {
        SERVICE_UP
            .with_label_values(&["library"])
            .set(snapshot.services.library as i64);
        SERVICE_UP
            .with_label_values(&["catalog"])
            .set(snapshot.services.catalog as i64);
    }

    let running = match state.scheduler() {
        Some(scheduler) => scheduler.status().await.running,
        None => false,
    };
    SCHEDULER_RUNNING.set(running as i64);
}

static NUMERIC_SEGMENT: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace volume ids with a placeholder).
pub fn normalize_path(path: &str) -> String {
    NUMERIC_SEGMENT.replace_all(path, "/{id}$1").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_numeric() {
        assert_eq!(normalize_path("/api/v1/volumes/4050"), "/api/v1/volumes/{id}");
    }

    #[test]
    fn test_normalize_path_numeric_middle() {
        assert_eq!(
            normalize_path("/api/v1/volumes/12/manualsearch"),
            "/api/v1/volumes/{id}/manualsearch"
        );
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/monitor/recent"), "/api/v1/monitor/recent");
        assert_eq!(normalize_path("/api/v1/v2x"), "/api/v1/v2x");
    }

    #[test]
    fn test_encode_includes_core_metrics() {
        longbox_core::metrics::DISCOVERY_FALLBACKS.inc();
        let text = encode_metrics();
        assert!(text.contains("longbox_discovery_fallbacks_total"));
    }
}
