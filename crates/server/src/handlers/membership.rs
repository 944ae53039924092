//! Business-network membership endpoints.

use super::common::{RequestedNode, call_node, membership_service};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use ledgerweb_core::{MembershipQuery, MembershipRequest, MembershipState, PartyName};
use serde::Deserialize;
use tracing::info;

/// Query string of the membership listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMembershipsParams {
    bno: Option<String>,
    network_id: Option<String>,
    force_refresh: Option<bool>,
    filter_out_missing_from_network_map: Option<bool>,
}

impl ListMembershipsParams {
    fn into_query(self) -> ApiResult<MembershipQuery> {
        let bno = self
            .bno
            .filter(|bno| !bno.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("bno is required".to_string()))?;
        let mut query = MembershipQuery::new(PartyName::parse(&bno)?);
        query.network_id = self.network_id.filter(|id| !id.is_empty());
        if let Some(force_refresh) = self.force_refresh {
            query.force_refresh = force_refresh;
        }
        if let Some(filter) = self.filter_out_missing_from_network_map {
            query.filter_out_missing_from_network_map = filter;
        }
        Ok(query)
    }
}

fn request_body(
    body: Result<Json<MembershipRequest>, JsonRejection>,
) -> ApiResult<MembershipRequest> {
    body.map(|Json(request)| request)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// POST /api/bnms/member/memberships
pub async fn create_membership(
    State(state): State<AppState>,
    node: RequestedNode,
    body: Result<Json<MembershipRequest>, JsonRejection>,
) -> ApiResult<Json<MembershipState>> {
    let request = request_body(body)?;
    let (name, service) = membership_service(&state, &node)?;
    let membership = call_node(
        &name,
        "create_membership",
        service.create_membership_request(request),
    )
    .await?;
    info!(node = %name, linear_id = %membership.linear_id, "Membership requested");
    Ok(Json(membership))
}

/// PUT /api/bnms/member/memberships
pub async fn amend_membership(
    State(state): State<AppState>,
    node: RequestedNode,
    body: Result<Json<MembershipRequest>, JsonRejection>,
) -> ApiResult<Json<MembershipState>> {
    let request = request_body(body)?;
    let (name, service) = membership_service(&state, &node)?;
    let membership = call_node(
        &name,
        "amend_membership",
        service.amend_membership_request(request),
    )
    .await?;
    info!(node = %name, linear_id = %membership.linear_id, "Membership amended");
    Ok(Json(membership))
}

/// GET /api/bnms/member/memberships
pub async fn list_memberships(
    State(state): State<AppState>,
    node: RequestedNode,
    params: Result<Query<ListMembershipsParams>, QueryRejection>,
) -> ApiResult<Json<Vec<MembershipState>>> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let query = params.into_query()?;
    let (name, service) = membership_service(&state, &node)?;
    let memberships = call_node(&name, "list_memberships", service.list_memberships(query)).await?;
    Ok(Json(memberships))
}
