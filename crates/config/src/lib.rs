//! Configuration loading, validation, and management for PromptLab.
//!
//! Loads configuration from `~/.promptlab/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the main (OpenAI) API key.
pub const MAIN_API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable holding the evaluator (Gemini) API key.
pub const EVALUATOR_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// The root configuration structure.
///
/// Maps directly to `~/.promptlab/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// The model that writes START, THINK and OUTPUT steps and answers the
    /// prompting demos
    #[serde(default = "EndpointConfig::main_default")]
    pub main: EndpointConfig,

    /// The judge model used by the chain-of-thought evaluator
    #[serde(default = "EndpointConfig::evaluator_default")]
    pub evaluator: EndpointConfig,

    /// Retry and timeout policy for every provider call
    #[serde(default)]
    pub retry: RetryConfig,

    /// Chain-of-thought loop settings
    #[serde(default)]
    pub chain: ChainConfig,

    /// Self-consistency voting settings
    #[serde(default)]
    pub self_consistency: SelfConsistencyConfig,
}

/// One chat-completion endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Provider name ("openai", "gemini", or any OpenAI-compatible name)
    pub provider: String,

    /// Model requested from the provider
    pub model: String,

    /// Name recorded on the steps this endpoint produces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl EndpointConfig {
    fn main_default() -> Self {
        Self {
            provider: "openai".into(),
            model: "gpt-4.1-mini".into(),
            display_name: Some("GPT-4.1-mini".into()),
            api_url: None,
            api_key: None,
        }
    }

    fn evaluator_default() -> Self {
        Self {
            provider: "gemini".into(),
            model: "gemini-2.5-flash".into(),
            display_name: Some("Gemini-2.5-flash".into()),
            api_url: None,
            api_key: None,
        }
    }

    /// The name shown next to steps; falls back to the model id.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.model)
    }

    /// Switch to another model. The display name belonged to the old model,
    /// so steps are labelled with the new model id from here on.
    pub fn override_model(&mut self, model: String) {
        self.model = model;
        self.display_name = None;
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("display_name", &self.display_name)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff after attempt `k` is `base_delay_ms * 2^k`
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    #[serde(default = "default_low_temperature")]
    pub main_temperature: f32,

    #[serde(default = "default_low_temperature")]
    pub evaluation_temperature: f32,

    /// Pause between loop iterations
    #[serde(default = "default_thinking_delay_ms")]
    pub thinking_delay_ms: u64,

    /// Recent steps shown to the judge
    #[serde(default = "default_context_size")]
    pub evaluator_context: usize,

    /// Recent steps shown when writing the next or improved THINK
    #[serde(default = "default_context_size")]
    pub improver_context: usize,
}

fn default_max_steps() -> usize {
    20
}
fn default_low_temperature() -> f32 {
    0.1
}
fn default_thinking_delay_ms() -> u64 {
    500
}
fn default_context_size() -> usize {
    5
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            main_temperature: default_low_temperature(),
            evaluation_temperature: default_low_temperature(),
            thinking_delay_ms: default_thinking_delay_ms(),
            evaluator_context: default_context_size(),
            improver_context: default_context_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfConsistencyConfig {
    #[serde(default = "default_attempts")]
    pub attempts: usize,

    /// Pause between sampled completions
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

fn default_attempts() -> usize {
    5
}
fn default_pause_ms() -> u64 {
    300
}

impl Default for SelfConsistencyConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            pause_ms: default_pause_ms(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.promptlab/config.toml).
    ///
    /// Environment variables take priority over the file:
    /// - `OPENAI_API_KEY`, `GEMINI_API_KEY` (only when the file sets no key)
    /// - `PROMPTLAB_MAIN_MODEL`, `PROMPTLAB_EVALUATOR_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.main.api_key.is_none() {
            self.main.api_key = lookup(MAIN_API_KEY_VAR);
        }
        if self.evaluator.api_key.is_none() {
            self.evaluator.api_key = lookup(EVALUATOR_API_KEY_VAR);
        }
        if let Some(model) = lookup("PROMPTLAB_MAIN_MODEL") {
            self.main.override_model(model);
        }
        if let Some(model) = lookup("PROMPTLAB_EVALUATOR_MODEL") {
            self.evaluator.override_model(model);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".promptlab")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, t) in [
            ("chain.main_temperature", self.chain.main_temperature),
            ("chain.evaluation_temperature", self.chain.evaluation_temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0.0 and 2.0"
                )));
            }
        }

        // START + THINK + EVALUATE is the shortest chain that can reach OUTPUT
        if self.chain.max_steps < 3 {
            return Err(ConfigError::ValidationError(
                "chain.max_steps must be at least 3".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be > 0".into(),
            ));
        }

        if self.self_consistency.attempts == 0 {
            return Err(ConfigError::ValidationError(
                "self_consistency.attempts must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Error unless the main endpoint has an API key.
    pub fn require_main_key(&self) -> Result<(), ConfigError> {
        if self.main.api_key.is_none() {
            return Err(ConfigError::MissingApiKey {
                endpoint: "main",
                env_var: MAIN_API_KEY_VAR,
            });
        }
        Ok(())
    }

    /// Error unless both endpoints have API keys.
    pub fn require_all_keys(&self) -> Result<(), ConfigError> {
        self.require_main_key()?;
        if self.evaluator.api_key.is_none() {
            return Err(ConfigError::MissingApiKey {
                endpoint: "evaluator",
                env_var: EVALUATOR_API_KEY_VAR,
            });
        }
        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            main: EndpointConfig::main_default(),
            evaluator: EndpointConfig::evaluator_default(),
            retry: RetryConfig::default(),
            chain: ChainConfig::default(),
            self_consistency: SelfConsistencyConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("{env_var} environment variable is required (no api_key set for the {endpoint} endpoint)")]
    MissingApiKey {
        endpoint: &'static str,
        env_var: &'static str,
    },
}
