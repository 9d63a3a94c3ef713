//! Error types for the governance workflow.

use thiserror::Error;

/// Result type alias for governance operations.
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Errors that can occur outside the per-query recovery path.
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// The configured model is not served by the model server.
    #[error("model not found: {model} (server {base_url})")]
    ModelNotFound { model: String, base_url: String },

    /// The model call failed.
    #[error("{0}")]
    Generation(String),

    /// A query was submitted without an action.
    #[error("no action provided")]
    EmptyAction,

    /// Workflow state could not be normalized.
    #[error("invalid workflow state: {0}")]
    InvalidState(String),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
