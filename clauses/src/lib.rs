//! # Clause Store
//!
//! Turns a plain-text policy corpus into fine-grained clauses that can be
//! embedded, retrieved and cited independently.
//!
//! ## Segmentation
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  "Section N:" split ──► numbered points "1.2. ... ."            │
//! │                              │ (none in section)                │
//! │                              ▼                                  │
//! │                         sentences > 20 chars                    │
//! │                                                                 │
//! │  nothing at all ──► lines > 30 chars, "Section N: title" labels │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod clause;
pub mod error;
pub mod parser;

pub use clause::{Clause, ClauseKind};
pub use error::{ClauseError, Result};
pub use parser::{ClauseParser, ParserConfig};
