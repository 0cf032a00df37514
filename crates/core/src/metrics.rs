//! Prometheus metrics for the background monitor and its upstream services.

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Discovery
// =============================================================================

/// Discovery runs by result ("added", "nothing_added", "no_candidates").
pub static DISCOVERY_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("longbox_discovery_runs_total", "Total release discovery runs"),
        &["result"],
    )
    .unwrap()
});

/// Candidates surviving the discovery filters per run.
pub static DISCOVERY_CANDIDATES: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "longbox_discovery_candidates",
            "Candidate volumes returned per discovery run",
        )
        .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
    )
    .unwrap()
});

/// Fallback broad queries issued because the per-publisher pass came back thin.
pub static DISCOVERY_FALLBACKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "longbox_discovery_fallbacks_total",
        "Fallback catalog queries issued during discovery",
    )
    .unwrap()
});

/// Volumes processed by the acquisition workflow, by outcome.
pub static VOLUMES_ACQUIRED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("longbox_volumes_total", "Volumes processed by acquisition"),
        &["outcome"], // "added", "already_exists", "failed"
    )
    .unwrap()
});

/// Size of the existing-library id cache after its last refresh.
pub static LIBRARY_CACHE_SIZE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "longbox_library_cache_size",
        "Catalog ids known to be present in the library",
    )
    .unwrap()
});

// =============================================================================
// Queue
// =============================================================================

/// Queue polls by result ("ok", "error").
pub static QUEUE_POLLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("longbox_queue_polls_total", "Download queue polls"),
        &["result"],
    )
    .unwrap()
});

/// Notifications emitted by queue status.
pub static NOTIFICATIONS_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("longbox_notifications_total", "Download notifications emitted"),
        &["status"],
    )
    .unwrap()
});

/// Notifications held back by the dedup ledger.
pub static NOTIFICATIONS_SUPPRESSED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "longbox_notifications_suppressed_total",
        "Download notifications suppressed as duplicates",
    )
    .unwrap()
});

// =============================================================================
// Upstream services
// =============================================================================

/// Upstream request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "longbox_external_service_duration_seconds",
            "Duration of library and catalog calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// Upstream requests by outcome.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "longbox_external_service_requests_total",
            "Total library and catalog requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

/// Record one upstream call.
pub fn observe_request(service: &str, operation: &str, ok: bool, elapsed: std::time::Duration) {
    EXTERNAL_SERVICE_DURATION
        .with_label_values(&[service, operation])
        .observe(elapsed.as_secs_f64());
    EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[service, operation, if ok { "success" } else { "error" }])
        .inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(DISCOVERY_RUNS.clone()),
        Box::new(DISCOVERY_CANDIDATES.clone()),
        Box::new(DISCOVERY_FALLBACKS.clone()),
        Box::new(VOLUMES_ACQUIRED.clone()),
        Box::new(LIBRARY_CACHE_SIZE.clone()),
        Box::new(QUEUE_POLLS.clone()),
        Box::new(NOTIFICATIONS_SENT.clone()),
        Box::new(NOTIFICATIONS_SUPPRESSED.clone()),
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}
