//! Workflow state and its normalization adapter.
//!
//! Stages run on [`AgentState`]. Callers may hand state in either as that
//! record or as a loosely-typed JSON mapping; [`StateInput::normalize`] is
//! the single place where the two are reconciled.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::decision::Decision;
use crate::error::{GovernanceError, Result};

/// One archived workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub action: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub context: String,
    #[serde(alias = "result")]
    pub decision: Decision,
}

/// Working record threaded through one workflow run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    /// The action the user proposes to take.
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,

    /// The context and reason for the proposed action.
    #[serde(default, deserialize_with = "null_as_default")]
    pub context: String,

    /// Rendered policy clauses found by the Retrieve stage.
    #[serde(default, deserialize_with = "null_as_default")]
    pub retrieved_policies: String,

    /// Decision produced by the Evaluate stage.
    #[serde(default, alias = "llm_decision")]
    pub decision: Option<Decision>,

    /// Past runs, oldest first.
    #[serde(default, deserialize_with = "null_as_default")]
    pub memory: Vec<MemoryEntry>,
}

impl AgentState {
    /// Create a fresh state for a query.
    pub fn new(action: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            context: context.into(),
            ..Default::default()
        }
    }

    /// Carry memory over from earlier runs.
    pub fn with_memory(mut self, memory: Vec<MemoryEntry>) -> Self {
        self.memory = memory;
        self
    }

    /// Render the state as a JSON mapping.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// State as handed to a stage: structured or loosely typed.
#[derive(Debug, Clone)]
pub enum StateInput {
    Record(AgentState),
    Map(Value),
}

impl StateInput {
    /// Convert to the canonical state record.
    pub fn normalize(self) -> Result<AgentState> {
        match self {
            Self::Record(state) => Ok(state),
            Self::Map(value @ Value::Object(_)) => serde_json::from_value(value)
                .map_err(|e| GovernanceError::InvalidState(e.to_string())),
            Self::Map(other) => Err(GovernanceError::InvalidState(format!(
                "expected a mapping, got {other}"
            ))),
        }
    }
}

impl From<AgentState> for StateInput {
    fn from(state: AgentState) -> Self {
        Self::Record(state)
    }
}

impl From<Value> for StateInput {
    fn from(value: Value) -> Self {
        Self::Map(value)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
