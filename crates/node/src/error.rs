//! Node service error types.

use thiserror::Error;

/// Node operation errors.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("node not found: {name} (available: {})", .available.join(", "))]
    NodeNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("node unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("node returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] ledgerweb_core::Error),
}

impl NodeError {
    /// Wrap into an `io::Error` so it can travel through async readers.
    pub fn into_io(self) -> std::io::Error {
        match self {
            Self::Io(err) => err,
            other => std::io::Error::other(other),
        }
    }

    /// Recover a `NodeError` previously wrapped by [`NodeError::into_io`].
    pub fn from_io(err: std::io::Error) -> Self {
        if !err
            .get_ref()
            .is_some_and(|inner| inner.is::<NodeError>())
        {
            return Self::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<NodeError>()) {
            Some(Ok(inner)) => *inner,
            _ => Self::Io(std::io::Error::from(kind)),
        }
    }

    /// Whether the error means "the requested thing does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::NodeNotFound { .. })
    }
}

impl From<zip::result::ZipError> for NodeError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => Self::from_io(io),
            other => Self::InvalidArchive(other.to_string()),
        }
    }
}

/// Result type for node operations.
pub type NodeResult<T> = std::result::Result<T, NodeError>;
