//! HTTP gateway in front of a set of ledger nodes.
//!
//! This crate provides the REST surface:
//! - Node identity and network map queries, per node
//! - Attachment download, entry extraction and upload
//! - Business-network membership requests
//! - Global network map refresh, health and text conversion echoes

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod trace;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
pub use trace::TraceId;
