//! # Embeddings
//!
//! Embedding generation and vector math for the policy index.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert clause and query text to dense vectors
//! - **Normalized Output**: Every provider returns unit-length vectors, so an
//!   inner product is a cosine similarity
//! - **Multiple Providers**: Deterministic feature hashing (offline) and any
//!   OpenAI-compatible embeddings endpoint
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding ──► similarity::top_k          │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  HashingProvider / OpenAIProvider                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod provider;
pub mod similarity;

pub use error::{EmbeddingError, Result};
pub use provider::{EmbeddingProvider, HashingProvider, OpenAIProvider};
pub use similarity::{ScoredIndex, cosine_similarity, dot_product, normalize, top_k};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension used by the hashing provider (matches all-MiniLM-L6-v2).
pub const DEFAULT_DIMENSION: usize = 384;
