//! The Retrieve, Evaluate, Archive workflow.
//!
//! Each query runs the three stages once, in order. Failures inside a stage
//! never abort the run; they leave degraded but well-formed state behind.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};
use warden_retrieval::{NO_POLICIES_FOUND, PolicyRetriever, format_policies};

use crate::decision::{Decision, parse_decision};
use crate::error::{GovernanceError, Result};
use crate::generator::Generator;
use crate::prompt::build_prompt;
use crate::state::{AgentState, MemoryEntry, StateInput};

/// A workflow stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Retrieve,
    Evaluate,
    Archive,
}

impl Stage {
    /// Stages in execution order.
    pub const ALL: [Stage; 3] = [Stage::Retrieve, Stage::Evaluate, Stage::Archive];

    /// The stage that follows this one, if any.
    pub fn next(self) -> Option<Stage> {
        match self {
            Self::Retrieve => Some(Self::Evaluate),
            Self::Evaluate => Some(Self::Archive),
            Self::Archive => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Retrieve => "retrieve",
            Self::Evaluate => "evaluate",
            Self::Archive => "archive",
        };
        f.write_str(name)
    }
}

/// Orchestrates retrieval and model evaluation for one query at a time.
pub struct Workflow {
    retriever: PolicyRetriever,
    generator: Option<Arc<dyn Generator>>,
    top_k: usize,
}

impl Workflow {
    /// Create a workflow. Without a generator every decision is an `Error`
    /// outcome.
    pub fn new(retriever: PolicyRetriever, generator: Option<Arc<dyn Generator>>) -> Self {
        let top_k = retriever.config().query.top_k;
        Self {
            retriever,
            generator,
            top_k,
        }
    }

    /// Override the number of clauses retrieved per query.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Get the retriever.
    pub fn retriever(&self) -> &PolicyRetriever {
        &self.retriever
    }

    /// Whether a model is available for evaluation.
    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Run every stage on `input`.
    pub async fn run(&self, input: impl Into<StateInput>) -> Result<AgentState> {
        let state = input.into().normalize()?;
        Ok(self.execute(state).await)
    }

    /// Run a single stage on `input`.
    pub async fn run_stage(&self, stage: Stage, input: impl Into<StateInput>) -> Result<AgentState> {
        let state = input.into().normalize()?;
        Ok(self.step(stage, state).await)
    }

    async fn execute(&self, mut state: AgentState) -> AgentState {
        let mut stage = Some(Stage::Retrieve);
        while let Some(current) = stage {
            state = self.step(current, state).await;
            stage = current.next();
        }
        state
    }

    async fn step(&self, stage: Stage, state: AgentState) -> AgentState {
        debug!("Entering {stage} stage");
        match stage {
            Stage::Retrieve => self.retrieve(state).await,
            Stage::Evaluate => self.evaluate(state).await,
            Stage::Archive => archive(state),
        }
    }

    async fn retrieve(&self, mut state: AgentState) -> AgentState {
        let query = build_query(&state.action, &state.context);

        state.retrieved_policies = match self.retriever.retrieve(&query, self.top_k).await {
            Ok(clauses) if clauses.is_empty() => {
                info!("No policy clauses matched the query");
                NO_POLICIES_FOUND.to_string()
            }
            Ok(clauses) => {
                info!("Retrieved {} policy clauses", clauses.len());
                format_policies(&clauses)
            }
            Err(e) => {
                warn!("Error retrieving policies: {e}");
                NO_POLICIES_FOUND.to_string()
            }
        };
        state
    }

    async fn evaluate(&self, mut state: AgentState) -> AgentState {
        let Some(generator) = &self.generator else {
            warn!("No model available, skipping evaluation");
            state.decision = Some(Decision::model_unavailable());
            return state;
        };

        let prompt = build_prompt(
            &state.action,
            &state.context,
            &state.retrieved_policies,
            &state.memory,
        );

        let decision = match generator.generate(&prompt).await {
            Ok(text) => parse_decision(&text),
            Err(e) => {
                warn!("Generation with {} failed: {e}", generator.name());
                Decision::generation_failed(e)
            }
        };
        info!("Decision: {}", decision.outcome);

        state.decision = Some(decision);
        state
    }
}

fn archive(mut state: AgentState) -> AgentState {
    let decision = state.decision.clone().unwrap_or_else(|| {
        warn!("Archiving a run without a decision");
        Decision::fallback()
    });

    state.memory.push(MemoryEntry {
        action: state.action.clone(),
        context: state.context.clone(),
        decision,
    });
    state
}

/// Retrieval query for an action and its context.
pub fn build_query(action: &str, context: &str) -> String {
    format!("Action: {action}\nContext: {context}")
        .trim()
        .to_string()
}

/// A sequence of queries sharing one memory.
pub struct Session {
    workflow: Workflow,
    memory: Vec<MemoryEntry>,
}

impl Session {
    /// Start a session with empty memory.
    pub fn new(workflow: Workflow) -> Self {
        Self {
            workflow,
            memory: Vec::new(),
        }
    }

    /// Get the workflow.
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// Past runs, oldest first.
    pub fn memory(&self) -> &[MemoryEntry] {
        &self.memory
    }

    /// Evaluate an action and remember the outcome.
    pub async fn submit(&mut self, action: &str, context: &str) -> Result<Decision> {
        let action = action.trim();
        if action.is_empty() {
            return Err(GovernanceError::EmptyAction);
        }

        let state = AgentState::new(action, context.trim())
            .with_memory(std::mem::take(&mut self.memory));
        let state = self.workflow.execute(state).await;

        self.memory = state.memory;
        Ok(state.decision.unwrap_or_else(Decision::fallback))
    }
}
