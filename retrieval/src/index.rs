//! Persisted vector index over policy clauses.
//!
//! The index directory holds `index.json` (clauses with their embeddings)
//! and `.timestamp` (the corpus mtime the index was built from, as a
//! decimal string). The corpus mtime is the only staleness signal.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};
use warden_clauses::{Clause, ClauseParser};
use warden_embeddings::{EmbeddingError, EmbeddingProvider, ScoredIndex, top_k};

use crate::config::RetrievalConfig;
use crate::error::{Result, RetrievalError};

/// File name of the serialized index.
pub const INDEX_FILE: &str = "index.json";

/// File name of the freshness marker.
pub const TIMESTAMP_FILE: &str = ".timestamp";

/// Freshness contract between a persisted index and its corpus file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Corpus modification time, in seconds since the Unix epoch.
    pub source_mtime: f64,
}

/// On-disk index format.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    model: String,
    dimension: usize,
    clauses: Vec<Clause>,
}

/// Inner-product index over embedded clauses.
///
/// The index owns the clauses and the provider that embedded them, so
/// queries are always embedded in the same space as the corpus.
pub struct VectorIndex {
    source_path: PathBuf,
    index_dir: PathBuf,
    mtime_tolerance_secs: f64,
    provider: Arc<dyn EmbeddingProvider>,
    parser: ClauseParser,

    /// `None` until a build or load succeeds.
    clauses: Option<Vec<Clause>>,
    metadata: Option<IndexMetadata>,
    rebuilds: usize,
}

impl VectorIndex {
    /// Create an empty, unloaded index.
    pub fn new(config: &RetrievalConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            source_path: config.policy_path.clone(),
            index_dir: config.index_dir.clone(),
            mtime_tolerance_secs: config.mtime_tolerance_secs,
            provider,
            parser: ClauseParser::new(),
            clauses: None,
            metadata: None,
            rebuilds: 0,
        }
    }

    /// The provider clauses were embedded with.
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Whether a build or load has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.clauses.is_some()
    }

    /// Number of indexed clauses.
    pub fn len(&self) -> usize {
        self.clauses.as_ref().map_or(0, Vec::len)
    }

    /// Check if the index holds no clauses.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a clause by position.
    pub fn clause(&self, index: usize) -> Option<&Clause> {
        self.clauses.as_ref()?.get(index)
    }

    /// Freshness metadata of the loaded index.
    pub fn metadata(&self) -> Option<IndexMetadata> {
        self.metadata
    }

    /// How many times this instance rebuilt the index.
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    fn index_path(&self) -> PathBuf {
        self.index_dir.join(INDEX_FILE)
    }

    fn timestamp_path(&self) -> PathBuf {
        self.index_dir.join(TIMESTAMP_FILE)
    }

    /// Whether a persisted index exists and was built from the current corpus.
    pub fn is_fresh(&self) -> bool {
        if !self.index_path().exists() {
            debug!("No persisted index at {}", self.index_dir.display());
            return false;
        }

        let stored = match read_timestamp(&self.timestamp_path()) {
            Ok(stored) => stored,
            Err(e) => {
                debug!("Freshness marker unusable: {e}");
                return false;
            }
        };

        let current = match source_mtime(&self.source_path) {
            Ok(current) => current,
            Err(e) => {
                debug!("Cannot stat policy file: {e}");
                return false;
            }
        };

        let fresh = stored >= current - self.mtime_tolerance_secs;
        if fresh {
            debug!("Policy file unchanged since index build");
        } else {
            debug!("Policy file changed since index build ({stored} < {current})");
        }
        fresh
    }

    /// Load the persisted index when fresh, otherwise rebuild it.
    ///
    /// A fresh index that fails to load is rebuilt unconditionally.
    pub async fn load_or_build(&mut self) -> Result<()> {
        if self.is_fresh() {
            match self.load().await {
                Ok(()) => {
                    info!(
                        "Loaded policy index with {} clauses from {}",
                        self.len(),
                        self.index_dir.display()
                    );
                    return Ok(());
                }
                Err(e) => warn!("Error loading policy index: {e}. Rebuilding."),
            }
        } else {
            info!("Policy index missing or stale, rebuilding");
        }

        self.rebuild().await
    }

    /// Parse the corpus and build a new index from it.
    pub async fn rebuild(&mut self) -> Result<()> {
        let clauses = self.parser.parse_file(&self.source_path)?;
        self.build(clauses).await
    }

    /// Embed `clauses`, persist them and make them searchable.
    pub async fn build(&mut self, clauses: Vec<Clause>) -> Result<()> {
        if clauses.is_empty() {
            return Err(RetrievalError::EmptyCorpus(self.source_path.clone()));
        }

        let texts: Vec<String> = clauses.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.provider.embed_batch(&texts).await?;
        if embeddings.len() != clauses.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                clauses.len(),
                embeddings.len()
            ))
            .into());
        }

        let dimension = self.provider.dimension();
        let clauses: Vec<Clause> = clauses
            .into_iter()
            .zip(embeddings)
            .map(|(clause, embedding)| {
                if embedding.len() != dimension {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: dimension,
                        actual: embedding.len(),
                    });
                }
                Ok(clause.with_embedding(embedding))
            })
            .collect::<std::result::Result<_, _>>()?;

        let metadata = IndexMetadata {
            source_mtime: source_mtime(&self.source_path)?,
        };
        let persisted = PersistedIndex {
            model: self.provider.model().to_string(),
            dimension,
            clauses,
        };
        self.save(&persisted, metadata).await?;

        info!(
            "Policy index built with {} clauses at {}",
            persisted.clauses.len(),
            self.index_dir.display()
        );

        self.clauses = Some(persisted.clauses);
        self.metadata = Some(metadata);
        self.rebuilds += 1;
        Ok(())
    }

    async fn save(&self, persisted: &PersistedIndex, metadata: IndexMetadata) -> Result<()> {
        fs::create_dir_all(&self.index_dir).await?;

        let path = self.index_path();
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_string(persisted)?).await?;
        fs::rename(&temp_path, &path).await?;

        fs::write(self.timestamp_path(), metadata.source_mtime.to_string()).await?;
        Ok(())
    }

    async fn load(&mut self) -> Result<()> {
        let content = fs::read_to_string(self.index_path()).await?;
        let persisted: PersistedIndex = serde_json::from_str(&content)?;

        if persisted.model != self.provider.model()
            || persisted.dimension != self.provider.dimension()
        {
            return Err(RetrievalError::IncompatibleIndex(format!(
                "built with {} ({} dims), provider is {} ({} dims)",
                persisted.model,
                persisted.dimension,
                self.provider.model(),
                self.provider.dimension()
            )));
        }

        if let Some(clause) = persisted
            .clauses
            .iter()
            .find(|c| c.embedding.len() != persisted.dimension)
        {
            return Err(EmbeddingError::DimensionMismatch {
                expected: persisted.dimension,
                actual: clause.embedding.len(),
            }
            .into());
        }

        let source_mtime = read_timestamp(&self.timestamp_path())?;

        self.clauses = Some(persisted.clauses);
        self.metadata = Some(IndexMetadata { source_mtime });
        Ok(())
    }

    /// Return up to `n` clause positions by descending inner product.
    pub fn search(&self, query: &[f32], n: usize) -> Result<Vec<ScoredIndex>> {
        let clauses = self
            .clauses
            .as_ref()
            .ok_or(RetrievalError::IndexUnavailable)?;

        Ok(top_k(
            query,
            clauses.iter().map(|c| c.embedding.as_slice()),
            n,
        )?)
    }
}

/// Modification time of `path` in seconds since the Unix epoch.
fn source_mtime(path: &Path) -> Result<f64> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64())
}

fn read_timestamp(path: &Path) -> Result<f64> {
    let raw = std::fs::read_to_string(path)?;
    raw.trim()
        .parse()
        .map_err(|e| RetrievalError::InvalidTimestamp(format!("{}: {e}", path.display())))
}
