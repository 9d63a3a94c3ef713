//! Error types for the clause store.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for clause operations.
pub type Result<T> = std::result::Result<T, ClauseError>;

/// Errors that can occur while loading a policy corpus.
#[derive(Error, Debug)]
pub enum ClauseError {
    /// Policy file does not exist.
    #[error("policy file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// No clause survived any segmentation strategy.
    #[error("no clauses found in policy file: {}", .0.display())]
    EmptyCorpus(PathBuf),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
