//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid party name: {0}")]
    InvalidPartyName(String),

    #[error("invalid node name: {0}")]
    InvalidNodeName(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
