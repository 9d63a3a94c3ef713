//! Error types for the retrieval engine.

use std::path::PathBuf;

use thiserror::Error;
use warden_clauses::ClauseError;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the retrieval engine.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Policy file does not exist.
    #[error("policy file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Policy file produced no clauses.
    #[error("no clauses found in policy file: {}", .0.display())]
    EmptyCorpus(PathBuf),

    /// Query issued before any successful build or load.
    #[error("policy index not initialized or load/build failed")]
    IndexUnavailable,

    /// Persisted index can not be used with the current embedding provider.
    #[error("incompatible index: {0}")]
    IncompatibleIndex(String),

    /// Freshness marker could not be read.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] warden_embeddings::EmbeddingError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ClauseError> for RetrievalError {
    fn from(err: ClauseError) -> Self {
        match err {
            ClauseError::NotFound(path) => Self::NotFound(path),
            ClauseError::EmptyCorpus(path) => Self::EmptyCorpus(path),
            ClauseError::Io(e) => Self::Io(e),
        }
    }
}
