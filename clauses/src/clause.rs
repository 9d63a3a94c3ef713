//! Clause records.

use serde::{Deserialize, Serialize};
use warden_embeddings::Embedding;

/// How a clause was segmented out of the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    /// A numbered point such as `1.2. ... .`.
    PolicyPoint,
    /// A sentence from a section without numbered points.
    Sentence,
    /// A whole line, used when the corpus has no section markers.
    Line,
}

/// One citable unit of policy text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// The clause text.
    pub text: String,

    /// Section label, e.g. `Section 1`.
    pub reference: String,

    /// Numbered point inside the section, e.g. `1.1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<String>,

    /// Segmentation strategy that produced this clause.
    pub kind: ClauseKind,

    /// Normalized embedding; empty until the clause is indexed.
    #[serde(default)]
    pub embedding: Embedding,
}

impl Clause {
    /// Create a new clause without an embedding.
    pub fn new(text: impl Into<String>, reference: impl Into<String>, kind: ClauseKind) -> Self {
        Self {
            text: text.into(),
            reference: reference.into(),
            point: None,
            kind,
            embedding: Embedding::new(),
        }
    }

    /// Set the numbered point.
    pub fn with_point(mut self, point: impl Into<String>) -> Self {
        self.point = Some(point.into());
        self
    }

    /// Attach an embedding.
    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = embedding;
        self
    }

    /// Whether an embedding has been attached.
    pub fn is_embedded(&self) -> bool {
        !self.embedding.is_empty()
    }

    /// Human-readable citation, e.g. `Section 1 (1.1)`.
    pub fn citation(&self) -> String {
        match &self.point {
            Some(point) => format!("{} ({point})", self.reference),
            None => self.reference.clone(),
        }
    }
}
