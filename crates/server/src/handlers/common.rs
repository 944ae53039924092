//! Shared handler helpers.

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;
use axum::extract::{FromRequestParts, Query, RawPathParams};
use axum::http::request::Parts;
use ledgerweb_core::{NodeName, NodeSelector, Party, PartyNameModel};
use ledgerweb_node::{MembershipService, NodeResult, NodeService};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Path parameter carrying the node name in `/api/nodes/{node_name}/...`.
pub const NODE_NAME_PARAM: &str = "node_name";

#[derive(Debug, Default, Deserialize)]
struct NodeNameQuery {
    #[serde(rename = "nodeName")]
    node_name: Option<String>,
}

/// The node a request is addressed to.
///
/// Taken from the path fragment when the route has one, else from the
/// `nodeName` query parameter. Blank values select the default node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestedNode(pub NodeSelector);

impl<S: Send + Sync> FromRequestParts<S> for RequestedNode {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let from_path = RawPathParams::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|params| {
                params
                    .iter()
                    .find(|(key, _)| *key == NODE_NAME_PARAM)
                    .map(|(_, value)| value.to_string())
            });

        let raw = match from_path {
            Some(name) => Some(name),
            None => Query::<NodeNameQuery>::try_from_uri(&parts.uri)
                .map_err(|e| ApiError::BadRequest(e.body_text()))?
                .0
                .node_name,
        };
        Ok(Self(NodeSelector::from_optional(raw.as_deref())))
    }
}

/// Resolve the node façade for a request.
pub fn node_service(
    state: &AppState,
    node: &RequestedNode,
) -> Result<(NodeName, Arc<dyn NodeService>), ApiError> {
    Ok(state.nodes.resolve_and_get(&node.0)?)
}

/// Resolve the membership service for a request.
pub fn membership_service(
    state: &AppState,
    node: &RequestedNode,
) -> Result<(NodeName, Arc<dyn MembershipService>), ApiError> {
    Ok(state.memberships.resolve_and_get(&node.0)?)
}

/// Run one node operation, recording it in the request metrics.
pub async fn call_node<T, F>(node: &NodeName, operation: &'static str, call: F) -> NodeResult<T>
where
    F: Future<Output = NodeResult<T>>,
{
    metrics::record_node_request(node.as_str(), operation);
    let started = Instant::now();
    let result = call.await;
    metrics::NODE_REQUEST_DURATION
        .with_label_values(&[operation])
        .observe(started.elapsed().as_secs_f64());
    result
}

/// Wire projection of a list of parties.
pub fn party_models(parties: &[Party]) -> Vec<PartyNameModel> {
    parties.iter().map(PartyNameModel::from).collect()
}
