//! Structured compliance decisions and the model-output parser.
//!
//! [`parse_decision`] never fails: anything it can not turn into a valid
//! decision becomes [`Decision::fallback`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Verdict of a compliance evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "Allowed")]
    Allowed,
    #[serde(rename = "Not Allowed")]
    NotAllowed,
    #[serde(rename = "Needs Review")]
    NeedsReview,
    /// Synthesized by the workflow when the model could not be consulted.
    #[serde(rename = "Error")]
    Error,
}

impl Outcome {
    /// Wire label of the outcome.
    pub fn label(self) -> &'static str {
        match self {
            Self::Allowed => "Allowed",
            Self::NotAllowed => "Not Allowed",
            Self::NeedsReview => "Needs Review",
            Self::Error => "Error",
        }
    }

    /// Parse a label a model may emit. `Error` is not one of them.
    pub fn from_model_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Allowed" => Some(Self::Allowed),
            "Not Allowed" => Some(Self::NotAllowed),
            "Needs Review" => Some(Self::NeedsReview),
            _ => None,
        }
    }

    fn from_state_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Error" => Some(Self::Error),
            other => Self::from_model_label(other),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The structured verdict returned for every query.
///
/// `suggested_changes` and `references` are always lists, whatever shape
/// the source produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Decision {
    #[serde(rename = "decision")]
    pub outcome: Outcome,
    pub reason: String,
    pub suggested_changes: Vec<String>,
    pub references: Vec<String>,
}

/// Reason of the fixed fallback decision.
pub const FALLBACK_REASON: &str = "Could not parse model response";

impl Decision {
    /// Create a decision.
    pub fn new(outcome: Outcome, reason: impl Into<String>) -> Self {
        Self {
            outcome,
            reason: reason.into(),
            suggested_changes: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Set the suggested changes.
    pub fn with_suggested_changes<I, S>(mut self, changes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggested_changes = changes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the policy references.
    pub fn with_references<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = references.into_iter().map(Into::into).collect();
        self
    }

    /// The terminal value for unparseable model output.
    pub fn fallback() -> Self {
        Self::new(Outcome::NeedsReview, FALLBACK_REASON)
            .with_suggested_changes(["Manual review required"])
            .with_references(["N/A"])
    }

    /// Decision used when no model is available.
    pub fn model_unavailable() -> Self {
        Self::new(Outcome::Error, "Model not initialized")
            .with_suggested_changes(["Check model path and initialization"])
    }

    /// Decision used when the model call itself fails.
    pub fn generation_failed(message: impl fmt::Display) -> Self {
        Self::new(Outcome::Error, format!("Generation failed: {message}"))
            .with_suggested_changes(["Check model configuration"])
    }

    fn from_value(value: &Value, accept_error: bool) -> Result<Self, ParseFailure> {
        let object = value.as_object().ok_or(ParseFailure::NotAnObject)?;

        let label = object
            .get("decision")
            .ok_or(ParseFailure::MissingField("decision"))?
            .as_str()
            .ok_or(ParseFailure::InvalidField("decision"))?;
        let outcome = if accept_error {
            Outcome::from_state_label(label)
        } else {
            Outcome::from_model_label(label)
        }
        .ok_or_else(|| ParseFailure::UnknownOutcome(label.to_string()))?;

        let reason = object
            .get("reason")
            .ok_or(ParseFailure::MissingField("reason"))?
            .as_str()
            .ok_or(ParseFailure::InvalidField("reason"))?;

        Ok(Self {
            outcome,
            reason: reason.to_string(),
            suggested_changes: coerce_list(object.get("suggested_changes")),
            references: coerce_list(object.get("references")),
        })
    }
}

impl TryFrom<Value> for Decision {
    type Error = ParseFailure;

    /// Lenient conversion used for workflow state; accepts `Error` outcomes.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value, true)
    }
}

/// Why model output could not be turned into a decision.
#[derive(Error, Debug)]
pub enum ParseFailure {
    #[error("no JSON object in response")]
    NoObject,

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` has the wrong type")]
    InvalidField(&'static str),

    #[error("unknown decision label `{0}`")]
    UnknownOutcome(String),
}

/// Extract a decision from raw model text.
///
/// The candidate object spans from the first `{` to the last `}`.
pub fn parse_decision(text: &str) -> Decision {
    match try_parse_decision(text) {
        Ok(decision) => {
            debug!("Parsed model decision: {}", decision.outcome);
            decision
        }
        Err(e) => {
            warn!("Model response parsing error: {e}");
            Decision::fallback()
        }
    }
}

fn try_parse_decision(text: &str) -> Result<Decision, ParseFailure> {
    let (start, end) = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => (start, end),
        _ => return Err(ParseFailure::NoObject),
    };

    let value: Value = serde_json::from_str(&text[start..=end])?;
    Decision::from_value(&value, false)
}

fn coerce_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
        Some(other) => vec![value_to_string(other)],
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
