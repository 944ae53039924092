//! Per-node network and identity queries.

use super::common::{RequestedNode, call_node, node_service, party_models};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use ledgerweb_core::PartyNameModel;
use time::format_description::well_known::Rfc3339;
use tracing::info;

/// GET /api/node/whoami
pub async fn whoami(
    State(state): State<AppState>,
    node: RequestedNode,
) -> ApiResult<Json<PartyNameModel>> {
    let (name, service) = node_service(&state, &node)?;
    let identity = call_node(&name, "whoami", service.identity()).await?;
    Ok(Json(PartyNameModel::from(&identity)))
}

/// GET /api/node/nodes
pub async fn nodes(
    State(state): State<AppState>,
    node: RequestedNode,
) -> ApiResult<Json<Vec<PartyNameModel>>> {
    let (name, service) = node_service(&state, &node)?;
    let parties = call_node(&name, "nodes", service.nodes()).await?;
    Ok(Json(party_models(&parties)))
}

/// GET /api/node/peers
pub async fn peers(
    State(state): State<AppState>,
    node: RequestedNode,
) -> ApiResult<Json<Vec<PartyNameModel>>> {
    let (name, service) = node_service(&state, &node)?;
    let parties = call_node(&name, "peers", service.peers()).await?;
    Ok(Json(party_models(&parties)))
}

/// GET /api/node/notaries
pub async fn notaries(
    State(state): State<AppState>,
    node: RequestedNode,
) -> ApiResult<Json<Vec<PartyNameModel>>> {
    let (name, service) = node_service(&state, &node)?;
    let parties = call_node(&name, "notaries", service.notaries()).await?;
    Ok(Json(party_models(&parties)))
}

/// GET /api/node/identities
pub async fn identities(
    State(state): State<AppState>,
    node: RequestedNode,
) -> ApiResult<Json<Vec<PartyNameModel>>> {
    let (name, service) = node_service(&state, &node)?;
    let parties = call_node(&name, "identities", service.identities()).await?;
    Ok(Json(party_models(&parties)))
}

/// GET /api/node/flows
pub async fn flows(
    State(state): State<AppState>,
    node: RequestedNode,
) -> ApiResult<Json<Vec<String>>> {
    let (name, service) = node_service(&state, &node)?;
    Ok(Json(call_node(&name, "flows", service.flows()).await?))
}

/// GET /api/node/addresses
pub async fn addresses(
    State(state): State<AppState>,
    node: RequestedNode,
) -> ApiResult<Json<Vec<String>>> {
    let (name, service) = node_service(&state, &node)?;
    let addresses = call_node(&name, "addresses", service.addresses()).await?;
    Ok(Json(addresses.iter().map(ToString::to_string).collect()))
}

/// GET /api/node/serverTime
pub async fn server_time(
    State(state): State<AppState>,
    node: RequestedNode,
) -> ApiResult<Json<String>> {
    let (name, service) = node_service(&state, &node)?;
    let time = call_node(&name, "server_time", service.server_time()).await?;
    let formatted = time
        .to_offset(time::UtcOffset::UTC)
        .format(&Rfc3339)
        .map_err(|e| ApiError::Internal(format!("failed to format server time: {e}")))?;
    Ok(Json(formatted))
}

/// GET /api/node/platformVersion
pub async fn platform_version(
    State(state): State<AppState>,
    node: RequestedNode,
) -> ApiResult<Json<u32>> {
    let (name, service) = node_service(&state, &node)?;
    Ok(Json(
        call_node(&name, "platform_version", service.platform_version()).await?,
    ))
}

/// POST /api/node/network-map/refresh
pub async fn refresh_network_map(
    State(state): State<AppState>,
    node: RequestedNode,
) -> ApiResult<StatusCode> {
    let (name, service) = node_service(&state, &node)?;
    call_node(&name, "refresh_network_map", service.refresh_network_map_cache()).await?;
    info!(node = %name, "Refreshed network map cache");
    Ok(StatusCode::NO_CONTENT)
}
