//! Policy retrieval engine implementation.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use warden_clauses::ClauseKind;
use warden_embeddings::EmbeddingProvider;

use crate::config::RetrievalConfig;
use crate::error::{Result, RetrievalError};
use crate::index::VectorIndex;

/// Placeholder policy block used when retrieval yields nothing.
pub const NO_POLICIES_FOUND: &str = "No relevant policies found.";

/// A clause matched by a query, with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedClause {
    /// The clause text.
    pub text: String,

    /// Section label.
    pub reference: String,

    /// Numbered point, if the clause has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<String>,

    /// Inner-product similarity to the query.
    pub score: f32,

    /// Segmentation strategy of the clause.
    pub kind: ClauseKind,
}

/// Retrieval engine over a freshness-aware policy index.
pub struct PolicyRetriever {
    /// Configuration.
    config: RetrievalConfig,

    /// Clause index.
    index: VectorIndex,
}

impl PolicyRetriever {
    /// Create a retriever. The index stays unavailable until [`Self::initialize`].
    pub fn new(config: RetrievalConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        let index = VectorIndex::new(&config, provider);
        Self { config, index }
    }

    /// Load the persisted index, rebuilding it when missing, stale or unreadable.
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing policy retriever");
        self.index.load_or_build().await?;
        info!("Policy retriever initialized with {} clauses", self.index.len());
        Ok(())
    }

    /// Get the configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Get the underlying index.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Get the underlying index mutably.
    pub fn index_mut(&mut self) -> &mut VectorIndex {
        &mut self.index
    }

    /// Return up to `k` distinct clauses scoring above the noise floor.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedClause>> {
        if !self.index.is_loaded() {
            return Err(RetrievalError::IndexUnavailable);
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.index.provider().embed(query).await?;

        let candidates = (self.config.query.overfetch_factor * k).min(self.index.len());
        let hits = self.index.search(&query_embedding, candidates)?;

        let mut seen: HashSet<&str> = HashSet::new();
        let mut results = Vec::with_capacity(k);

        for hit in hits {
            if results.len() >= k {
                break;
            }
            if hit.score <= self.config.query.min_score {
                continue;
            }
            let Some(clause) = self.index.clause(hit.index) else {
                continue;
            };
            if !seen.insert(clause.text.as_str()) {
                continue;
            }

            results.push(RetrievedClause {
                text: clause.text.clone(),
                reference: clause.reference.clone(),
                point: clause.point.clone(),
                score: hit.score,
                kind: clause.kind,
            });
        }

        results.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!("Retrieved {} clauses for query", results.len());
        Ok(results)
    }
}

/// Render retrieved clauses as the policy block of a prompt.
pub fn format_policies(results: &[RetrievedClause]) -> String {
    if results.is_empty() {
        return NO_POLICIES_FOUND.to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, clause)| {
            let reference = match &clause.point {
                Some(point) => format!("{} ({point})", clause.reference),
                None => clause.reference.clone(),
            };
            format!(
                "[Policy {} | {reference} | score={:.3}]\n{}",
                i + 1,
                clause.score,
                clause.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use warden_embeddings::HashingProvider;

    #[tokio::test]
    async fn test_retrieve_before_initialize_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let config = RetrievalConfig::new(
            temp_dir.path().join("policy.txt"),
            temp_dir.path().join("index"),
        );
        let retriever = PolicyRetriever::new(config, Arc::new(HashingProvider::new()));

        let err = retriever.retrieve("anything", 4).await.unwrap_err();
        assert!(matches!(err, RetrievalError::IndexUnavailable));
    }

    #[tokio::test]
    async fn test_initialize_with_missing_corpus_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let config = RetrievalConfig::new(
            temp_dir.path().join("missing.txt"),
            temp_dir.path().join("index"),
        );
        let mut retriever = PolicyRetriever::new(config, Arc::new(HashingProvider::new()));

        let err = retriever.initialize().await.unwrap_err();
        assert!(matches!(err, RetrievalError::NotFound(_)));
        assert!(!retriever.index().is_loaded());
    }

    #[test]
    fn test_format_policies() {
        let clauses = vec![
            RetrievedClause {
                text: "Consent must be obtained.".to_string(),
                reference: "Section 1".to_string(),
                point: Some("1.1".to_string()),
                score: 0.5,
                kind: ClauseKind::PolicyPoint,
            },
            RetrievedClause {
                text: "Logs are kept for ninety days.".to_string(),
                reference: "Section 4: Retention".to_string(),
                point: None,
                score: 0.25,
                kind: ClauseKind::Line,
            },
        ];

        assert_eq!(
            format_policies(&clauses),
            "[Policy 1 | Section 1 (1.1) | score=0.500]\nConsent must be obtained.\n\n\
             [Policy 2 | Section 4: Retention | score=0.250]\nLogs are kept for ninety days."
        );
        assert_eq!(format_policies(&[]), NO_POLICIES_FOUND);
    }
}
