//! End-to-end behavior of the governance workflow with a stubbed model.

use std::fs;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use warden_governance::{
    AgentState, Decision, Generator, GovernanceError, Outcome, Session, Stage, Workflow,
};
use warden_retrieval::{HashingProvider, NO_POLICIES_FOUND, PolicyRetriever, RetrievalConfig};

const CONSENT_POLICY: &str = "Section 1: Data Use\n\
    1.1. Consent must be obtained before processing personal data.\n\
    Section 2: Retention\n\
    2.1. Audit logs are retained for ninety days.\n";

const NOT_ALLOWED_REPLY: &str = r#"Here is my assessment:
{
    "decision": "Not Allowed",
    "reason": "Section 1 requires consent before processing personal data.",
    "suggested_changes": ["Obtain explicit user consent first."],
    "references": ["Section 1"]
}"#;

/// Replies with a fixed text (or error) and records every prompt.
struct RecordingGenerator {
    reply: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, prompt: &str) -> warden_governance::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(GovernanceError::Generation)
    }
}

async fn initialized_retriever(dir: &TempDir, policy: &str) -> PolicyRetriever {
    let path = dir.path().join("policy.txt");
    fs::write(&path, policy).unwrap();
    let config = RetrievalConfig::new(path, dir.path().join("index"));
    let mut retriever = PolicyRetriever::new(config, Arc::new(HashingProvider::new()));
    retriever.initialize().await.unwrap();
    retriever
}

fn uninitialized_retriever(dir: &TempDir) -> PolicyRetriever {
    let config = RetrievalConfig::new(dir.path().join("missing.txt"), dir.path().join("index"));
    PolicyRetriever::new(config, Arc::new(HashingProvider::new()))
}

#[tokio::test]
async fn test_consent_violation_end_to_end() {
    let dir = TempDir::new().unwrap();
    let generator = RecordingGenerator::replying(NOT_ALLOWED_REPLY);
    let workflow = Workflow::new(
        initialized_retriever(&dir, CONSENT_POLICY).await,
        Some(generator.clone()),
    );

    let state = workflow
        .run(AgentState::new("Process user data without consent", ""))
        .await
        .unwrap();

    assert!(state.retrieved_policies.contains("Section 1 (1.1)"));
    assert!(state.retrieved_policies.contains("Consent must be obtained"));

    let decision = state.decision.unwrap();
    assert_eq!(decision.outcome, Outcome::NotAllowed);
    assert_eq!(decision.references, vec!["Section 1"]);

    assert_eq!(state.memory.len(), 1);
    assert_eq!(state.memory[0].action, "Process user data without consent");

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Consent must be obtained"));
    assert!(!prompts[0].contains("PREVIOUS DECISIONS"));
}

#[tokio::test]
async fn test_prompt_history_is_bounded_to_last_eight_runs() {
    let dir = TempDir::new().unwrap();
    let generator = RecordingGenerator::replying(NOT_ALLOWED_REPLY);
    let mut session = Session::new(Workflow::new(
        initialized_retriever(&dir, CONSENT_POLICY).await,
        Some(generator.clone()),
    ));

    for i in 1..=10 {
        session.submit(&format!("run-{i:02}"), "").await.unwrap();
    }
    session.submit("final check", "").await.unwrap();

    assert_eq!(session.memory().len(), 11);

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 11);
    let last = &prompts[10];
    for i in 3..=10 {
        assert!(
            last.contains(&format!("- run-{i:02} -> Not Allowed")),
            "run-{i:02} missing"
        );
    }
    assert!(!last.contains("run-01"));
    assert!(!last.contains("run-02"));
}

#[tokio::test]
async fn test_retrieval_failure_degrades_to_placeholder() {
    let dir = TempDir::new().unwrap();
    let generator = RecordingGenerator::replying(NOT_ALLOWED_REPLY);
    let workflow = Workflow::new(uninitialized_retriever(&dir), Some(generator.clone()));

    let state = workflow
        .run(AgentState::new("Share logs", "vendor audit"))
        .await
        .unwrap();

    assert_eq!(state.retrieved_policies, NO_POLICIES_FOUND);
    assert!(generator.prompts()[0].contains(NO_POLICIES_FOUND));
    assert_eq!(state.decision.unwrap().outcome, Outcome::NotAllowed);
}

#[tokio::test]
async fn test_generation_failure_yields_error_decision() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::new(Workflow::new(
        initialized_retriever(&dir, CONSENT_POLICY).await,
        Some(RecordingGenerator::failing("connection refused")),
    ));

    let decision = session.submit("Share logs", "").await.unwrap();
    assert_eq!(decision, Decision::generation_failed("connection refused"));
    assert_eq!(decision.suggested_changes, vec!["Check model configuration"]);
    assert_eq!(session.memory().len(), 1);
}

#[tokio::test]
async fn test_missing_model_yields_error_decision() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::new(Workflow::new(
        initialized_retriever(&dir, CONSENT_POLICY).await,
        None,
    ));

    let decision = session.submit("Share logs", "").await.unwrap();
    assert_eq!(decision, Decision::model_unavailable());
    assert!(!session.workflow().has_generator());
}

#[tokio::test]
async fn test_unparseable_reply_yields_fallback() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::new(Workflow::new(
        initialized_retriever(&dir, CONSENT_POLICY).await,
        Some(RecordingGenerator::replying("I am not sure.")),
    ));

    let decision = session.submit("Share logs", "").await.unwrap();
    assert_eq!(decision, Decision::fallback());
}

#[tokio::test]
async fn test_empty_action_is_rejected() {
    let dir = TempDir::new().unwrap();
    let generator = RecordingGenerator::replying(NOT_ALLOWED_REPLY);
    let mut session = Session::new(Workflow::new(
        uninitialized_retriever(&dir),
        Some(generator.clone()),
    ));

    let err = session.submit("   ", "context only").await.unwrap_err();
    assert!(matches!(err, GovernanceError::EmptyAction));
    assert!(generator.prompts().is_empty());
    assert!(session.memory().is_empty());
}

#[tokio::test]
async fn test_stages_accept_mapping_input() {
    let dir = TempDir::new().unwrap();
    let workflow = Workflow::new(uninitialized_retriever(&dir), None);

    let state = workflow
        .run_stage(
            Stage::Archive,
            json!({
                "action": "Delete backups",
                "context": null,
                "llm_decision": {
                    "decision": "Needs Review",
                    "reason": "Retention unclear.",
                    "suggested_changes": "Ask security.",
                    "references": null
                },
                "memory": []
            }),
        )
        .await
        .unwrap();

    assert_eq!(state.memory.len(), 1);
    assert_eq!(state.memory[0].decision.outcome, Outcome::NeedsReview);
    assert_eq!(state.memory[0].decision.suggested_changes, vec!["Ask security."]);

    let err = workflow.run(json!("not a mapping")).await.unwrap_err();
    assert!(matches!(err, GovernanceError::InvalidState(_)));
}
