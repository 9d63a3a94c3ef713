//! Console query parsing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An action to evaluate and its context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInput {
    pub action: String,
    pub context: String,
}

impl QueryInput {
    /// Whether there is nothing to evaluate.
    pub fn is_empty(&self) -> bool {
        self.action.is_empty()
    }
}

/// Parse raw console input.
///
/// Accepted forms, tried in order:
/// - a JSON object with `action` and `context` keys
/// - `action [context]`: the text before the first `[` is the action and the
///   first bracketed segment is the context
/// - anything else is the action, with no context
pub fn parse_query_input(raw: &str) -> QueryInput {
    let raw = raw.trim();

    if let Some(Value::Object(map)) = raw
        .starts_with('{')
        .then(|| serde_json::from_str::<Value>(raw).ok())
        .flatten()
    {
        let field = |key: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string()
        };
        return QueryInput {
            action: field("action"),
            context: field("context"),
        };
    }

    if let Some((action, rest)) = raw.split_once('[') {
        if let Some((context, _)) = rest.split_once(']') {
            return QueryInput {
                action: action.trim().to_string(),
                context: context.trim().to_string(),
            };
        }
    }

    QueryInput {
        action: raw.to_string(),
        context: String::new(),
    }
}
