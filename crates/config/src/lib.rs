//! Configuration loading, validation, and management for trialmind.
//!
//! Loads configuration from `~/.trialmind/config.toml` with environment
//! variable overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Reflection strategy names accepted in `[agent] reflect_strategy`.
pub const REFLECT_STRATEGIES: &[&str] =
    &["none", "last_attempt", "reflexion", "last_attempt_and_reflexion"];

/// Docstore kinds accepted in `[tools] docstore`.
pub const DOCSTORE_KINDS: &[&str] = &["wikipedia", "memory"];

/// The root configuration structure.
///
/// Maps directly to `~/.trialmind/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature for every agent call
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Per-request timeout for LLM calls
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Retries for rate-limited, timed-out or 5xx LLM calls
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Loop budgets and reflection settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// External tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Custom model pricing overrides (model name → pricing)
    #[serde(default)]
    pub pricing: HashMap<String, PricingOverrideConfig>,

    /// Few-shot example files
    #[serde(default)]
    pub prompts: PromptsConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_request_timeout() -> u64 {
    120
}
fn default_max_retries() -> u32 {
    3
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .field("providers", &self.providers)
            .field("pricing", &self.pricing)
            .field("prompts", &self.prompts)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Budgets shared by the agent loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Steps per ReAct trial
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Prompt-size budget (estimated tokens) per ReAct trial
    #[serde(default = "default_prompt_budget")]
    pub max_tokens: usize,

    /// Trials per Reflexion episode
    #[serde(default = "default_max_trials")]
    pub max_trials: usize,

    /// Reflections kept in the prompt
    #[serde(default = "default_max_reflections")]
    pub max_reflections: usize,

    /// Consecutive identical wrong answers before a Reflexion episode gives up
    /// (unset = same as max_trials)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patience: Option<usize>,

    /// Critique rounds for CRITIC
    #[serde(default = "default_max_interactions")]
    pub max_interactions: usize,

    /// One of [`REFLECT_STRATEGIES`]
    #[serde(default = "default_reflect_strategy")]
    pub reflect_strategy: String,

    /// Whether CRITIC consults tools while critiquing
    #[serde(default = "default_true")]
    pub use_tool: bool,

    /// Token budget for a previous trial shown to the model by `last_attempt`
    #[serde(default = "default_last_attempt_tokens")]
    pub last_attempt_tokens: usize,
}

fn default_max_steps() -> usize {
    6
}
fn default_prompt_budget() -> usize {
    5000
}
fn default_max_trials() -> usize {
    3
}
fn default_max_reflections() -> usize {
    3
}
fn default_max_interactions() -> usize {
    3
}
fn default_reflect_strategy() -> String {
    "reflexion".into()
}
fn default_last_attempt_tokens() -> usize {
    1600
}
fn default_true() -> bool {
    true
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_tokens: default_prompt_budget(),
            max_trials: default_max_trials(),
            max_reflections: default_max_reflections(),
            patience: None,
            max_interactions: default_max_interactions(),
            reflect_strategy: default_reflect_strategy(),
            use_tool: true,
            last_attempt_tokens: default_last_attempt_tokens(),
        }
    }
}

impl AgentSettings {
    /// Effective patience: explicit value or the trial budget.
    pub fn effective_patience(&self) -> usize {
        self.patience.unwrap_or(self.max_trials)
    }
}

/// External tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Interpreter used for Calculate/Implement/Test actions
    #[serde(default = "default_python_bin")]
    pub python_bin: String,

    /// Wall-clock limit for one code execution
    #[serde(default = "default_exec_timeout")]
    pub exec_timeout_secs: u64,

    /// One of [`DOCSTORE_KINDS`]
    #[serde(default = "default_docstore")]
    pub docstore: String,

    /// MediaWiki API endpoint for the wikipedia docstore
    #[serde(default = "default_wikipedia_url")]
    pub wikipedia_url: String,

    /// JSON file of `{ "title": ..., "content": ... }` pages for the memory docstore
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_path: Option<String>,
}

fn default_python_bin() -> String {
    "python3".into()
}
fn default_exec_timeout() -> u64 {
    10
}
fn default_docstore() -> String {
    "wikipedia".into()
}
fn default_wikipedia_url() -> String {
    "https://en.wikipedia.org/w/api.php".into()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            python_bin: default_python_bin(),
            exec_timeout_secs: default_exec_timeout(),
            docstore: default_docstore(),
            wikipedia_url: default_wikipedia_url(),
            documents_path: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// Custom per-million-token pricing for a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingOverrideConfig {
    /// Price per 1M input tokens in USD
    pub input_per_m: f64,
    /// Price per 1M output tokens in USD
    pub output_per_m: f64,
}

/// Few-shot example files, keyed by benchmark name (e.g. "hotpotqa").
///
/// Example text is inserted verbatim into the `{examples}` slot of the
/// agent prompts. Benchmarks without an entry run zero-shot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    #[serde(default)]
    pub examples: HashMap<String, String>,

    /// Reflection examples, keyed the same way
    #[serde(default)]
    pub reflect_examples: HashMap<String, String>,
}

impl PromptsConfig {
    /// Read the example file configured for `benchmark`, if any.
    pub fn load_examples(&self, benchmark: &str) -> Result<String, ConfigError> {
        read_optional(self.examples.get(benchmark))
    }

    /// Read the reflection example file configured for `benchmark`, if any.
    pub fn load_reflect_examples(&self, benchmark: &str) -> Result<String, ConfigError> {
        read_optional(self.reflect_examples.get(benchmark))
    }
}

fn read_optional(path: Option<&String>) -> Result<String, ConfigError> {
    let Some(path) = path else {
        return Ok(String::new());
    };
    std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: PathBuf::from(path),
        reason: e.to_string(),
    })
}

impl AppConfig {
    /// Load configuration from the default path (~/.trialmind/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `TRIALMIND_API_KEY` (highest priority)
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env();
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

    /// Environment variable overrides (highest priority).
    fn apply_env(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("TRIALMIND_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("TRIALMIND_PROVIDER") {
            self.default_provider = provider;
        }

        if let Ok(model) = std::env::var("TRIALMIND_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".trialmind")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".into(),
            ));
        }

        if self.agent.max_steps == 0 {
            return Err(ConfigError::ValidationError("agent.max_steps must be > 0".into()));
        }

        if self.agent.max_trials == 0 {
            return Err(ConfigError::ValidationError("agent.max_trials must be > 0".into()));
        }

        if self.agent.patience == Some(0) {
            return Err(ConfigError::ValidationError("agent.patience must be > 0".into()));
        }

        if !REFLECT_STRATEGIES.contains(&self.agent.reflect_strategy.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "agent.reflect_strategy must be one of {:?}, got '{}'",
                REFLECT_STRATEGIES, self.agent.reflect_strategy
            )));
        }

        if !DOCSTORE_KINDS.contains(&self.tools.docstore.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "tools.docstore must be one of {:?}, got '{}'",
                DOCSTORE_KINDS, self.tools.docstore
            )));
        }

        if self.tools.docstore == "memory" && self.tools.documents_path.is_none() {
            return Err(ConfigError::ValidationError(
                "tools.documents_path is required when tools.docstore = \"memory\"".into(),
            ));
        }

        Ok(())
    }

    /// The model to run: the default provider's own `default_model` when
    /// it sets one, otherwise the top-level `default_model`.
    pub fn model(&self) -> &str {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.default_model.as_deref())
            .unwrap_or(&self.default_model)
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
            agent: AgentSettings::default(),
            tools: ToolsConfig::default(),
            providers: HashMap::new(),
            pricing: HashMap::new(),
            prompts: PromptsConfig::default(),
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
}
