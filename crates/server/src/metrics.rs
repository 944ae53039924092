//! Prometheus metrics for the ledgerweb gateway.
//!
//! Counters are labelled by logical node name and operation so a scraper can
//! tell a slow or failing node apart from the rest of the network.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static NODE_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ledgerweb_node_requests_total",
            "Total number of requests dispatched to a node",
        ),
        &["node", "operation"],
    )
    .expect("metric creation failed")
});

pub static NODE_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ledgerweb_node_request_duration_seconds",
            "Time spent waiting on a node operation",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"],
    )
    .expect("metric creation failed")
});

pub static API_ERRORS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("ledgerweb_api_errors_total", "Total API errors by code"),
        &["code"],
    )
    .expect("metric creation failed")
});

pub static ATTACHMENT_DOWNLOADS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ledgerweb_attachment_downloads_total",
            "Attachment downloads by kind (archive, entry, paths)",
        ),
        &["kind"],
    )
    .expect("metric creation failed")
});

pub static ATTACHMENTS_UPLOADED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "ledgerweb_attachments_uploaded_total",
        "Total number of attachments saved",
    )
    .expect("metric creation failed")
});

pub static ATTACHMENT_BYTES_UPLOADED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "ledgerweb_attachment_bytes_uploaded_total",
        "Total bytes received in attachment uploads",
    )
    .expect("metric creation failed")
});

pub static NETWORK_MAP_REFRESH_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ledgerweb_network_map_refresh_failures_total",
            "Network map refreshes that failed, by node",
        ),
        &["node"],
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(NODE_REQUESTS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(NODE_REQUEST_DURATION.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(API_ERRORS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ATTACHMENT_DOWNLOADS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ATTACHMENTS_UPLOADED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ATTACHMENT_BYTES_UPLOADED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(NETWORK_MAP_REFRESH_FAILURES.clone()))
            .expect("metric registration failed");
    });
}

/// Handler for the /metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Count a dispatched node operation.
pub fn record_node_request(node: &str, operation: &str) {
    NODE_REQUESTS.with_label_values(&[node, operation]).inc();
}
