//! Errors raised while turning text into vectors.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Failures of an [`EmbeddingProvider`](crate::EmbeddingProvider) or of the
/// vector math over its output.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// A remote provider was selected without an API key.
    #[error("no API key for the embedding service (set OPENAI_API_KEY)")]
    MissingApiKey,

    /// The embedding service answered with a non-success status.
    #[error("embedding service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The service answered, but not with the expected vectors.
    #[error("malformed embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding service is throttling requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Two vectors that must share a space have different lengths.
    #[error("vector has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),
}
