//! Ranking contract of the retrieval engine.

use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use warden_embeddings::{Embedding, EmbeddingProvider, normalize};
use warden_retrieval::{HashingProvider, PolicyRetriever, RetrievalConfig};

/// Maps `alpha`, `beta` and `gamma` to their own axes and every other
/// token to a shared filler axis, so scores are easy to reason about.
struct AxisProvider;

#[async_trait]
impl EmbeddingProvider for AxisProvider {
    fn name(&self) -> &str {
        "axis"
    }

    fn model(&self) -> &str {
        "axis-v1"
    }

    fn dimension(&self) -> usize {
        4
    }

    async fn embed(&self, text: &str) -> warden_embeddings::Result<Embedding> {
        let mut embedding = vec![0.0f32; 4];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let axis = match token.to_lowercase().as_str() {
                "alpha" => 0,
                "beta" => 1,
                "gamma" => 2,
                _ => 3,
            };
            embedding[axis] += 1.0;
        }
        normalize(&mut embedding);
        Ok(embedding)
    }

    fn is_available(&self) -> bool {
        true
    }
}

async fn retriever_for(
    dir: &TempDir,
    policy: &str,
    provider: Arc<dyn EmbeddingProvider>,
) -> PolicyRetriever {
    let path = dir.path().join("policy.txt");
    fs::write(&path, policy).unwrap();
    let config = RetrievalConfig::new(path, dir.path().join("index"));
    let mut retriever = PolicyRetriever::new(config, provider);
    retriever.initialize().await.unwrap();
    retriever
}

#[tokio::test]
async fn test_identical_texts_collapse_to_one_result() {
    let dir = TempDir::new().unwrap();
    let policy = "Section 1: Storage\n1.1. Encrypt all backups before upload.\n\
                  Section 2: Transfer\n2.1. Encrypt all backups before upload.\n";
    let retriever = retriever_for(&dir, policy, Arc::new(HashingProvider::new())).await;
    assert_eq!(retriever.index().len(), 2);

    let one = retriever.retrieve("encrypt backups", 1).await.unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].reference, "Section 1");

    let all = retriever.retrieve("encrypt backups", 5).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_scores_at_or_below_floor_are_dropped() {
    let dir = TempDir::new().unwrap();
    // 1.2 has one alpha among ten filler tokens: 1 / sqrt(101) < 0.1.
    let policy = "Section 1: Axes\n\
                  1.1. alpha strong match.\n\
                  1.2. alpha w1 w2 w3 w4 w5 w6 w7 w8 w9 w10.\n\
                  1.3. beta only here.\n\
                  1.4. alpha x1 x2 x3.\n";
    let retriever = retriever_for(&dir, policy, Arc::new(AxisProvider)).await;

    let results = retriever.retrieve("alpha", 4).await.unwrap();
    let points: Vec<&str> = results
        .iter()
        .map(|r| r.point.as_deref().unwrap_or_default())
        .collect();

    assert_eq!(points, vec!["1.1", "1.4"]);
    assert!(results.iter().all(|r| r.score > 0.1));
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn test_fewer_than_k_is_not_padded() {
    let dir = TempDir::new().unwrap();
    let policy = "Section 1: Axes\n1.1. gamma rule.\n1.2. beta rule.\n";
    let retriever = retriever_for(&dir, policy, Arc::new(AxisProvider)).await;

    let results = retriever.retrieve("gamma", 10).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text, "gamma rule.");
}

#[tokio::test]
async fn test_consent_clause_is_surfaced() {
    let dir = TempDir::new().unwrap();
    let policy = "Section 1: Data Use\n\
                  1.1. Consent must be obtained before processing personal data.";
    let retriever = retriever_for(&dir, policy, Arc::new(HashingProvider::new())).await;

    let results = retriever
        .retrieve("Action: Process user data without consent\nContext:", 4)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].reference, "Section 1");
    assert!(results[0].score > 0.1);
}
