//! Liveness and configuration summary.

use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub nodes: Vec<String>,
    pub default_node: String,
}

/// GET /api/health
///
/// Reports `degraded` when no node is configured. Nodes are not contacted.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.nodes.is_empty() {
            "degraded"
        } else {
            "ok"
        },
        nodes: state.nodes.names().map(ToString::to_string).collect(),
        default_node: state.nodes.default_node().to_string(),
    })
}
