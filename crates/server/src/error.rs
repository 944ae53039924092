//! API error types.

use crate::metrics;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ledgerweb_node::NodeError;
use serde::Serialize;
use tracing::{debug, warn};

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error("bad request: {0}")]
    Core(#[from] ledgerweb_core::Error),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::Internal(_) => "internal_error",
            Self::Core(_) => "bad_request",
            Self::Node(e) => match e {
                NodeError::NodeNotFound { .. } => "node_not_found",
                NodeError::NotFound(_) => "not_found",
                NodeError::RemoteUnavailable(_) => "remote_unavailable",
                NodeError::Remote { .. } => "remote_error",
                NodeError::Protocol(_) => "protocol_error",
                NodeError::InvalidUpload(_) => "invalid_upload",
                NodeError::InvalidArchive(_) => "invalid_archive",
                NodeError::Core(_) => "bad_request",
                NodeError::Io(_) | NodeError::Config(_) => "internal_error",
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Core(_) => StatusCode::BAD_REQUEST,
            Self::Node(e) => match e {
                NodeError::NodeNotFound { .. } | NodeError::NotFound(_) => StatusCode::NOT_FOUND,
                NodeError::RemoteUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                NodeError::Remote { .. } | NodeError::Protocol(_) => StatusCode::BAD_GATEWAY,
                NodeError::InvalidUpload(_) | NodeError::Core(_) => StatusCode::BAD_REQUEST,
                NodeError::InvalidArchive(_) => StatusCode::UNPROCESSABLE_ENTITY,
                NodeError::Io(_) | NodeError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        if status.is_server_error() {
            warn!(%status, code, error = %self, "Request failed");
        } else {
            debug!(%status, code, error = %self, "Request rejected");
        }
        metrics::API_ERRORS.with_label_values(&[code]).inc();

        let body = ErrorResponse {
            code: code.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
