//! Engine-facing error types.
//!
//! A `#[non_exhaustive]` enum with one `thiserror` variant per failure
//! kind, plus a crate-local `Result` alias. Subsystem errors
//! (`IntegrityError`, `ConnectorError`, `EmbeddingError`, `BuilderError`)
//! are distinct types so callers can match on the specific failure, and
//! convert into `EngineError` at the point where propagation policy
//! applies.

use crate::connector::ConnectorError;
use crate::embeddings::EmbeddingError;
use crate::vectorstore::IntegrityError;

/// Top-level error surfaced by the Recommendation Engine.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Bad `k`, unknown strategy, malformed ids. Surfaced to the caller.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Viewer absent. Converted to a fallback result by the Engine, not
    /// surfaced as a hard failure.
    #[error("not found: {0}")]
    NotFound(String),

    /// Manifest mismatch, checksum failure, dimension mismatch.
    #[error("integrity error: {0}")]
    IntegrityError(String),

    /// Connector or vector-store read timeout.
    #[error("degraded: {0}")]
    Degraded(String),

    /// Programmer error; surfaced, never retried.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl From<IntegrityError> for EngineError {
    fn from(e: IntegrityError) -> Self {
        EngineError::IntegrityError(e.to_string())
    }
}

impl From<ConnectorError> for EngineError {
    fn from(e: ConnectorError) -> Self {
        match e {
            ConnectorError::NotFound(msg) => EngineError::NotFound(msg),
            other => EngineError::Degraded(other.to_string()),
        }
    }
}

impl From<EmbeddingError> for EngineError {
    fn from(e: EmbeddingError) -> Self {
        EngineError::Internal(e.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for EngineError {
    fn from(e: tokio::time::error::Elapsed) -> Self {
        EngineError::Degraded(format!("timed out: {e}"))
    }
}
