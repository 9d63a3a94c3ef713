//! # warden
//!
//! Interactive compliance console. Reads a proposed action (a JSON object
//! or `action [context]` text) terminated by a blank line, and prints the
//! decision as JSON. An empty submission exits.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use warden_governance::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, Generator, GeneratorConfig, GovernanceError, OllamaGenerator,
    Session, Workflow, parse_query_input,
};
use warden_retrieval::{
    EmbeddingProvider, HashingProvider, OpenAIProvider, PolicyRetriever, RetrievalConfig,
};

/// Check proposed actions against a policy document.
#[derive(Parser, Debug)]
#[command(name = "warden", version, about, long_about = None)]
struct Cli {
    /// Policy corpus file.
    #[arg(long, env = "WARDEN_POLICY_PATH", default_value = "data/data_policy.txt")]
    policy_path: PathBuf,

    /// Directory for the persisted policy index.
    #[arg(long, env = "WARDEN_INDEX_DIR", default_value = "data/policy_index")]
    index_dir: PathBuf,

    /// Model served by the model server.
    #[arg(long, env = "WARDEN_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Model server address.
    #[arg(long, env = "WARDEN_LLM_URL", default_value = DEFAULT_BASE_URL)]
    llm_url: String,

    /// Embedding backend.
    #[arg(long, env = "WARDEN_EMBEDDER", value_enum, default_value_t = Embedder::Hashing)]
    embedder: Embedder,

    /// Policy clauses retrieved per query.
    #[arg(long, env = "WARDEN_TOP_K", default_value_t = 4)]
    top_k: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Embedder {
    /// Offline feature hashing.
    Hashing,
    /// OpenAI-compatible embeddings API (reads `OPENAI_API_KEY`).
    Openai,
}

impl Embedder {
    fn provider(self) -> Arc<dyn EmbeddingProvider> {
        match self {
            Self::Hashing => Arc::new(HashingProvider::new()),
            Self::Openai => Arc::new(OpenAIProvider::new()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    info!("warden v{}", env!("CARGO_PKG_VERSION"));

    let mut session = bootstrap(&cli).await;
    run_console(&mut session).await
}

/// Build the session. Corpus and model failures degrade the output
/// instead of aborting.
async fn bootstrap(cli: &Cli) -> Session {
    let config = RetrievalConfig::new(&cli.policy_path, &cli.index_dir).with_top_k(cli.top_k);
    let mut retriever = PolicyRetriever::new(config, cli.embedder.provider());
    if let Err(e) = retriever.initialize().await {
        error!("Policy index unavailable: {e}");
    }

    let generator_config = GeneratorConfig::default()
        .with_model(&cli.model)
        .with_base_url(&cli.llm_url);
    let generator: Option<Arc<dyn Generator>> =
        match OllamaGenerator::connect(generator_config).await {
            Ok(generator) => Some(Arc::new(generator)),
            Err(e) => {
                warn!("Model unavailable, decisions will report errors: {e}");
                None
            }
        };

    Session::new(Workflow::new(retriever, generator))
}

async fn run_console(session: &mut Session) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprintln!("Describe the action (JSON or `action [context]`), then a blank line:");

        let mut buffer: Vec<String> = Vec::new();
        let mut eof = false;
        loop {
            match lines.next_line().await? {
                Some(line) if line.trim().is_empty() => break,
                Some(line) => buffer.push(line),
                None => {
                    eof = true;
                    break;
                }
            }
        }

        if buffer.is_empty() {
            info!("Empty submission, exiting");
            return Ok(());
        }

        let query = parse_query_input(&buffer.join("\n"));
        match session.submit(&query.action, &query.context).await {
            Ok(decision) => println!("{}", serde_json::to_string_pretty(&decision)?),
            Err(GovernanceError::EmptyAction) => warn!("No action provided"),
            Err(e) => return Err(e.into()),
        }

        if eof {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["warden"]).unwrap();
        assert_eq!(cli.top_k, 4);
        assert!(matches!(cli.embedder, Embedder::Hashing));
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "warden",
            "--policy-path",
            "policies.txt",
            "--embedder",
            "openai",
            "--top-k",
            "6",
        ])
        .unwrap();
        assert_eq!(cli.policy_path, PathBuf::from("policies.txt"));
        assert_eq!(cli.top_k, 6);
        assert!(matches!(cli.embedder, Embedder::Openai));
    }
}
