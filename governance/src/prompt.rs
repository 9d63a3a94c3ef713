//! Prompt construction for the Evaluate stage.

use crate::state::MemoryEntry;

/// Number of past decisions shown to the model.
pub const HISTORY_WINDOW: usize = 8;

/// One line per entry for the last [`HISTORY_WINDOW`] entries, oldest first.
///
/// Returns `None` when there is no history.
pub fn history_block(memory: &[MemoryEntry]) -> Option<String> {
    if memory.is_empty() {
        return None;
    }

    let window = &memory[memory.len().saturating_sub(HISTORY_WINDOW)..];
    Some(
        window
            .iter()
            .map(|entry| format!("- {} -> {}", entry.action, entry.decision.outcome))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// Build the evaluation prompt.
pub fn build_prompt(action: &str, context: &str, policies: &str, memory: &[MemoryEntry]) -> String {
    let mut prompt = String::from(
        "You are a compliance governance agent. \
         Analyze this action against the provided policy clauses.\n\n",
    );

    prompt.push_str(&format!("ACTION: {action}\nCONTEXT: {context}\n\n"));
    prompt.push_str(&format!("POLICY CLAUSES:\n{policies}\n\n"));

    if let Some(history) = history_block(memory) {
        prompt.push_str(&format!(
            "PREVIOUS DECISIONS (oldest first, stay consistent with them):\n{history}\n\n"
        ));
    }

    prompt.push_str(
        r#"Provide your analysis in this EXACT JSON format (no additional text):

{
    "decision": "Allowed|Not Allowed|Needs Review",
    "reason": "Brief clear reason referencing specific policy",
    "suggested_changes": [
        "Specific actionable change"
    ],
    "references": [
        "Section X"
    ]
}

IMPORTANT:
- Keep reason brief and clear (1-2 sentences)
- suggested_changes must be an array of specific actionable items
- references must be an array of specific policy sections
- Use the exact format above with no additional text
"#,
    );

    prompt
}
