//! Network map refresh across every configured node.

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

/// A node whose refresh failed.
#[derive(Debug, Serialize)]
pub struct RefreshFailure {
    pub node: String,
    pub code: &'static str,
    pub message: String,
}

/// Outcome of a global refresh.
#[derive(Debug, Default, Serialize)]
pub struct RefreshReport {
    pub refreshed: Vec<String>,
    pub failed: Vec<RefreshFailure>,
}

/// POST /api/network-map/refresh
///
/// Refreshes every node concurrently. A failing node never stops the others;
/// the report is returned with 502 when any node failed.
pub async fn refresh_all(State(state): State<AppState>) -> Response {
    let refreshes = state.nodes.iter().map(|(name, service)| async move {
        metrics::record_node_request(name.as_str(), "refresh_network_map");
        (name, service.refresh_network_map_cache().await)
    });

    let mut report = RefreshReport::default();
    for (name, result) in join_all(refreshes).await {
        match result {
            Ok(()) => report.refreshed.push(name.to_string()),
            Err(e) => {
                warn!(node = %name, error = %e, "Network map refresh failed");
                metrics::NETWORK_MAP_REFRESH_FAILURES
                    .with_label_values(&[name.as_str()])
                    .inc();
                let error = ApiError::from(e);
                report.failed.push(RefreshFailure {
                    node: name.to_string(),
                    code: error.code(),
                    message: error.to_string(),
                });
            }
        }
    }

    info!(
        refreshed = report.refreshed.len(),
        failed = report.failed.len(),
        "Global network map refresh finished"
    );
    let status = if report.failed.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(report)).into_response()
}
