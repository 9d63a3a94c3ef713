//! # Governance Workflow
//!
//! Evaluates a proposed action against the policy corpus and returns a
//! structured [`Decision`]:
//!
//! - **Retrieve**: finds the policy clauses closest to the action
//! - **Evaluate**: prompts a [`Generator`] with the clauses and recent
//!   history, then parses its reply
//! - **Archive**: records the outcome in session memory
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden_governance::{GeneratorConfig, OllamaGenerator, Session, Workflow};
//! use warden_retrieval::{HashingProvider, PolicyRetriever, RetrievalConfig};
//!
//! let mut retriever = PolicyRetriever::new(RetrievalConfig::default(), Arc::new(HashingProvider::new()));
//! retriever.initialize().await?;
//!
//! let generator = OllamaGenerator::connect(GeneratorConfig::default()).await?;
//! let mut session = Session::new(Workflow::new(retriever, Some(Arc::new(generator))));
//!
//! let decision = session.submit("Share customer emails", "marketing campaign").await?;
//! ```

pub mod decision;
pub mod error;
pub mod generator;
pub mod input;
pub mod prompt;
pub mod state;
pub mod workflow;

pub use decision::{Decision, FALLBACK_REASON, Outcome, ParseFailure, parse_decision};
pub use error::{GovernanceError, Result};
pub use generator::{DEFAULT_BASE_URL, DEFAULT_MODEL, Generator, GeneratorConfig, OllamaGenerator};
pub use input::{QueryInput, parse_query_input};
pub use prompt::{HISTORY_WINDOW, build_prompt, history_block};
pub use state::{AgentState, MemoryEntry, StateInput};
pub use workflow::{Session, Stage, Workflow, build_query};
