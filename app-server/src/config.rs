//! Service configuration loaded from a TOML file.
//!
//! Every section falls back to defaults, so an empty or missing file gives a
//! working configuration against the public OpenAI API.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use askwhy_embeddings::OpenAICompatibleProvider;
use askwhy_retrieval::{OpenAIChatProvider, RetrievalConfig, UserProfile};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "askwhy.toml";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub profile: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Requested output dimensions; the model default when unset.
    pub dimensions: Option<usize>,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            dimensions: None,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    /// Build the embedding provider described by this section.
    pub fn provider(&self) -> anyhow::Result<OpenAICompatibleProvider> {
        Ok(OpenAICompatibleProvider::new()
            .with_client(http_client(self.timeout_secs)?)
            .with_base_url(self.base_url.as_str())
            .with_model(self.model.as_str())
            .with_dimensions(self.dimensions)
            .with_api_key_from_env(&self.api_key_env))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            temperature: 0.3,
            timeout_secs: 60,
        }
    }
}

impl GenerationConfig {
    /// Build the generation provider described by this section.
    pub fn provider(&self) -> anyhow::Result<OpenAIChatProvider> {
        Ok(OpenAIChatProvider::new()
            .with_client(http_client(self.timeout_secs)?)
            .with_base_url(self.base_url.as_str())
            .with_model(self.model.as_str())
            .with_temperature(self.temperature)
            .with_api_key_from_env(&self.api_key_env))
    }
}

fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

impl AppConfig {
    /// Load config from `path`, or defaults when the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate config text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.retrieval.validate()?;
        Ok(config)
    }
}
