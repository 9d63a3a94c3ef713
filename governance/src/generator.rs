//! Text generation backends for the Evaluate stage.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{GovernanceError, Result};

/// Default model served by the local model server.
pub const DEFAULT_MODEL: &str = "gemma2:2b";

/// Default model server address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// A model that turns a prompt into text.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Settings for an [`OllamaGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Model tag, e.g. `gemma2:2b`.
    pub model: String,

    /// Model server address.
    pub base_url: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum number of generated tokens.
    pub max_tokens: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.1,
            max_tokens: 400,
        }
    }
}

impl GeneratorConfig {
    /// Use a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different server.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Generator backed by an Ollama-compatible HTTP server.
pub struct OllamaGenerator {
    config: GeneratorConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    /// Connect to the server and check that the configured model is served.
    pub async fn connect(config: GeneratorConfig) -> Result<Self> {
        let client = reqwest::Client::new();

        let response = client
            .get(format!("{}/api/tags", config.base_url))
            .send()
            .await?
            .error_for_status()?;
        let tags: TagsResponse = response.json().await?;

        if !tags.models.iter().any(|tag| serves(&tag.name, &config.model)) {
            return Err(GovernanceError::ModelNotFound {
                model: config.model,
                base_url: config.base_url,
            });
        }

        info!("Using model {} at {}", config.model, config.base_url);
        Ok(Self { config, client })
    }

    /// Get the configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

/// `llama3` is served as `llama3:latest`.
fn serves(tag: &str, model: &str) -> bool {
    tag == model || tag.strip_suffix(":latest") == Some(model)
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.max_tokens,
            },
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GovernanceError::Generation(format!(
                "model server returned {status}: {error_text}"
            )));
        }

        let result: GenerateResponse = response.json().await?;
        debug!("Model produced {} bytes", result.response.len());
        Ok(result.response)
    }
}
