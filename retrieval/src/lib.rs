//! # Retrieval Engine
//!
//! This crate keeps a vector index over the policy corpus and answers
//! ranked clause queries against it:
//!
//! - **Vector Index**: embeds clauses, persists them next to a freshness
//!   marker, and rebuilds when the corpus file is newer than the index
//! - **Retrieval Engine**: over-fetches neighbors, drops noise and duplicate
//!   texts, and returns the top clauses
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Policy Retrieval                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  policy.txt ──► ClauseParser ──► EmbeddingProvider              │
//! │                                        │                        │
//! │                                        ▼                        │
//! │               index.json + .timestamp ◄── VectorIndex           │
//! │                                        │                        │
//! │                                        ▼                        │
//! │  query ──► PolicyRetriever ──► threshold + dedup ──► clauses    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden_retrieval::{PolicyRetriever, RetrievalConfig};
//! use warden_embeddings::HashingProvider;
//!
//! let config = RetrievalConfig::new("data/data_policy.txt", "data/policy_index");
//! let mut retriever = PolicyRetriever::new(config, Arc::new(HashingProvider::new()));
//! retriever.initialize().await?;
//!
//! let clauses = retriever.retrieve("Share customer emails with a vendor", 4).await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod index;

pub use config::{QueryConfig, RetrievalConfig};
pub use engine::{NO_POLICIES_FOUND, PolicyRetriever, RetrievedClause, format_policies};
pub use error::{Result, RetrievalError};
pub use index::{INDEX_FILE, IndexMetadata, TIMESTAMP_FILE, VectorIndex};

// Re-export from dependencies for convenience
pub use warden_clauses::{Clause, ClauseKind, ClauseParser};
pub use warden_embeddings::{EmbeddingProvider, HashingProvider, OpenAIProvider};
