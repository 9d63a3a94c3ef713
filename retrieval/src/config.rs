//! Configuration for the retrieval engine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for policy indexing and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Path to the policy corpus.
    pub policy_path: PathBuf,

    /// Directory holding the persisted index and its freshness marker.
    pub index_dir: PathBuf,

    /// Query processing configuration.
    pub query: QueryConfig,

    /// Allowed mtime drift, in seconds, before an index counts as stale.
    pub mtime_tolerance_secs: f64,
}

impl RetrievalConfig {
    /// Create a new configuration with default values.
    pub fn new(policy_path: impl Into<PathBuf>, index_dir: impl Into<PathBuf>) -> Self {
        Self {
            policy_path: policy_path.into(),
            index_dir: index_dir.into(),
            query: QueryConfig::default(),
            mtime_tolerance_secs: 0.1,
        }
    }

    /// Set the query configuration.
    pub fn with_query(mut self, config: QueryConfig) -> Self {
        self.query = config;
        self
    }

    /// Set the number of clauses returned per query.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.query.top_k = top_k;
        self
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self::new("data/data_policy.txt", "data/policy_index")
    }
}

/// Configuration for query processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Number of clauses to return.
    pub top_k: usize,

    /// Results must score strictly above this value.
    pub min_score: f32,

    /// Candidates fetched per requested result, leaving room for filtering.
    pub overfetch_factor: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            min_score: 0.1,
            overfetch_factor: 3,
        }
    }
}
