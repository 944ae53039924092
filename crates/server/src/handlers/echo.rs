//! Text conversion round trips for path-bound values.

use crate::error::ApiResult;
use axum::Json;
use axum::extract::Path;
use ledgerweb_core::{AttachmentHash, CompositeIdentifier, PartyName};

/// GET /api/echo/hash/{hash}
pub async fn echo_hash(Path(raw): Path<String>) -> ApiResult<Json<String>> {
    let hash: AttachmentHash = raw.parse()?;
    Ok(Json(hash.to_string()))
}

/// GET /api/echo/identifier/{id}
pub async fn echo_identifier(Path(raw): Path<String>) -> ApiResult<Json<String>> {
    let id: CompositeIdentifier = raw.parse()?;
    Ok(Json(id.to_string()))
}

/// GET /api/echo/party-name/{name}
pub async fn echo_party_name(Path(raw): Path<String>) -> ApiResult<Json<String>> {
    Ok(Json(PartyName::parse(&raw)?.to_string()))
}
