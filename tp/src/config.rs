//! TaskPlanner configuration types and loading
//!
//! Loaded once at startup and handed to the planner as an immutable value.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::LlmError;

/// Main TaskPlanner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider connection settings shared by every stage
    pub llm: LlmConfig,

    /// Per-stage model selection and token budgets
    pub stages: StagesConfig,

    /// Bounds on the decomposition loop
    pub decomposition: DecompositionConfig,

    /// Graph rendering collaborator
    pub render: RenderConfig,

    /// Prompt template overrides
    pub prompts: PromptsConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this before building a planner to fail fast with clear messages.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.llm.provider.as_str(), "groq" | "openai" | "anthropic") {
            return Err(LlmError::UnknownProvider(self.llm.provider.clone()).into());
        }
        let env = self.llm.api_key_env();
        if std::env::var(&env).is_err() {
            return Err(eyre::eyre!("LLM API key not found. Set the {} environment variable.", env));
        }
        if self.decomposition.max_iterations == 0 {
            return Err(eyre::eyre!("decomposition.max-iterations must be at least 1"));
        }
        if self.decomposition.timeout_ms == 0 {
            return Err(eyre::eyre!("decomposition.timeout-ms must be greater than 0"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config: .taskplanner.yml
        let local_config = PathBuf::from(".taskplanner.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config: ~/.config/taskplanner/taskplanner.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("taskplanner").join("taskplanner.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: groq, openai (both OpenAI-compatible) or anthropic
    pub provider: String,

    /// Environment variable containing the API key (provider default when unset)
    #[serde(rename = "api-key-env", skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// API base URL (provider default when unset)
    #[serde(rename = "base-url", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Per-request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Client-side retries on transient HTTP statuses
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            api_key_env: None,
            base_url: None,
            timeout_ms: 60_000,
            max_retries: 0,
        }
    }
}

impl LlmConfig {
    /// API key environment variable, falling back to the provider's convention
    pub fn api_key_env(&self) -> String {
        if let Some(env) = &self.api_key_env {
            return env.clone();
        }
        match self.provider.as_str() {
            "anthropic" => "ANTHROPIC_API_KEY",
            "openai" => "OPENAI_API_KEY",
            _ => "GROQ_API_KEY",
        }
        .to_string()
    }

    /// Base URL, falling back to the provider's public endpoint
    pub fn base_url(&self) -> String {
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/').to_string();
        }
        match self.provider.as_str() {
            "anthropic" => "https://api.anthropic.com",
            "openai" => "https://api.openai.com",
            _ => "https://api.groq.com/openai",
        }
        .to_string()
    }

    /// Combine provider settings with one stage's model selection
    pub fn resolve(&self, stage: &StageConfig) -> ResolvedLlmConfig {
        ResolvedLlmConfig {
            provider: self.provider.clone(),
            model: stage.model.clone(),
            api_key_env: self.api_key_env(),
            base_url: self.base_url(),
            max_tokens: stage.max_tokens,
            timeout_ms: self.timeout_ms,
            max_retries: self.max_retries,
        }
    }
}

/// Everything a client needs to talk to one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key_env: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub max_retries: u32,
}

impl ResolvedLlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String, LlmError> {
        std::env::var(&self.api_key_env).map_err(|_| LlmError::MissingApiKey {
            env: self.api_key_env.clone(),
        })
    }
}

/// Model and token budget for one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageConfig {
    pub model: String,

    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}

impl StageConfig {
    fn new(model: &str, max_tokens: u32) -> Self {
        Self {
            model: model.to_string(),
            max_tokens,
        }
    }
}

/// How the flowchart stage produces its graph description
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowchartMode {
    /// Ask the collaborator for DOT text
    #[default]
    Llm,
    /// Build a sequential DOT chain locally
    Template,
}

/// Flowchart stage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowchartConfig {
    pub model: String,

    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    pub mode: FlowchartMode,
}

impl Default for FlowchartConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".to_string(),
            max_tokens: 1024,
            mode: FlowchartMode::Llm,
        }
    }
}

impl FlowchartConfig {
    pub fn stage(&self) -> StageConfig {
        StageConfig::new(&self.model, self.max_tokens)
    }
}

/// Per-stage settings
///
/// A stage section may set only `model` or only `max-tokens`; the other key
/// keeps that stage's default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StagesFile")]
pub struct StagesConfig {
    pub extractor: StageConfig,
    pub decomposer: StageConfig,
    pub evaluator: StageConfig,
    pub flowchart: FlowchartConfig,
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            extractor: StageConfig::new("gemma2-9b-it", 100),
            decomposer: StageConfig::new("llama-3.3-70b-versatile", 150),
            evaluator: StageConfig::new("llama-3.1-8b-instant", 200),
            flowchart: FlowchartConfig::default(),
        }
    }
}

/// A stage section as written in the config file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StageOverride {
    model: Option<String>,

    #[serde(rename = "max-tokens")]
    max_tokens: Option<u32>,
}

impl StageOverride {
    fn apply(self, base: StageConfig) -> StageConfig {
        StageConfig {
            model: self.model.unwrap_or(base.model),
            max_tokens: self.max_tokens.unwrap_or(base.max_tokens),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StagesFile {
    extractor: StageOverride,
    decomposer: StageOverride,
    evaluator: StageOverride,
    flowchart: FlowchartConfig,
}

impl From<StagesFile> for StagesConfig {
    fn from(file: StagesFile) -> Self {
        let defaults = StagesConfig::default();
        Self {
            extractor: file.extractor.apply(defaults.extractor),
            decomposer: file.decomposer.apply(defaults.decomposer),
            evaluator: file.evaluator.apply(defaults.evaluator),
            flowchart: file.flowchart,
        }
    }
}

/// Decomposition loop bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompositionConfig {
    /// Maximum collaborator calls before the loop gives up
    #[serde(rename = "max-iterations")]
    pub max_iterations: u32,

    /// Wall-clock budget for the whole loop in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            timeout_ms: 120_000,
        }
    }
}

impl DecompositionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Graph rendering collaborator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Executable that reads DOT on stdin and writes the artifact to stdout
    pub command: String,

    /// Arguments passed to the command
    pub args: Vec<String>,

    /// Render timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            command: "dot".to_string(),
            args: vec!["-Tsvg".to_string()],
            timeout_ms: 30_000,
        }
    }
}

/// Prompt template configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory searched for `{name}.pmt` overrides
    pub dir: PathBuf,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".taskplanner/prompts"),
        }
    }
}
