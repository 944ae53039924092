//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::trace::trace_id_middleware;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Per-node façade routes, mounted under `/api/node` and
/// `/api/nodes/{node_name}/node`.
fn node_routes() -> Router<AppState> {
    Router::new()
        .route("/whoami", get(handlers::whoami))
        .route("/nodes", get(handlers::nodes))
        .route("/peers", get(handlers::peers))
        .route("/notaries", get(handlers::notaries))
        .route("/identities", get(handlers::identities))
        .route("/flows", get(handlers::flows))
        .route("/addresses", get(handlers::addresses))
        .route("/serverTime", get(handlers::server_time))
        .route("/platformVersion", get(handlers::platform_version))
        .route("/network-map/refresh", post(handlers::refresh_network_map))
        .route("/attachments", post(handlers::upload_attachment))
        .route("/attachments/{hash}", get(handlers::download_attachment))
        .route(
            "/attachments/{hash}/{*sub_path}",
            get(handlers::attachment_entry),
        )
}

/// Membership routes, mounted under `/api/bnms/member` and
/// `/api/nodes/{node_name}/bnms/member`.
fn membership_routes() -> Router<AppState> {
    Router::new().route(
        "/memberships",
        post(handlers::create_membership)
            .put(handlers::amend_membership)
            .get(handlers::list_memberships),
    )
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Node name from the `nodeName` query parameter, or the default node
        .nest("/api/node", node_routes())
        .nest("/api/bnms/member", membership_routes())
        // Node name as a path fragment
        .nest("/api/nodes/{node_name}/node", node_routes())
        .nest("/api/nodes/{node_name}/bnms/member", membership_routes())
        .route("/api/network-map/refresh", post(handlers::refresh_all))
        .route("/api/health", get(handlers::health))
        .route("/api/echo/hash/{hash}", get(handlers::echo_hash))
        .route("/api/echo/identifier/{id}", get(handlers::echo_identifier))
        .route("/api/echo/party-name/{name}", get(handlers::echo_party_name));

    let mut router = Router::new().merge(api_routes);

    // Only expose /metrics where the scraper network is trusted.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    // Layers run outermost first: TraceLayer -> trace id -> body limit -> handler
    router
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes))
        .layer(middleware::from_fn(trace_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
