//! Configuration loading, validation, and management for moot.
//!
//! Loads configuration from `moot.toml` in the working directory (or the
//! path in `MOOT_CONFIG`), with environment variable overrides for the
//! backend endpoint and database path. Validates all settings at startup;
//! everything is immutable afterward.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `moot.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Chat-log prompt format
    #[serde(default)]
    pub prompt: PromptFormatConfig,

    /// Persona templates per prompt kind
    #[serde(default)]
    pub personas: PersonaSet,

    /// Persistence settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Content-addressed store settings
    #[serde(default)]
    pub content: ContentConfig,
}

/// Settings for the llama.cpp-style completion backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Completion endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Token budget for an assembled prompt
    #[serde(default = "default_max_prompt_tokens")]
    pub max_prompt_tokens: usize,

    /// Token cap for a single generation (`n_predict`)
    #[serde(default = "default_max_completion_tokens")]
    pub max_completion_tokens: usize,

    /// Attempts per completion call before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Rounds per streamed response before forcing a stop
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8080/completion".into()
}
fn default_request_timeout_secs() -> u64 {
    120
}
fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    0.9
}
fn default_top_k() -> u32 {
    40
}
fn default_max_prompt_tokens() -> usize {
    2048
}
fn default_max_completion_tokens() -> usize {
    512
}
fn default_max_attempts() -> usize {
    3
}
fn default_max_rounds() -> usize {
    8
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_prompt_tokens: default_max_prompt_tokens(),
            max_completion_tokens: default_max_completion_tokens(),
            max_attempts: default_max_attempts(),
            max_rounds: default_max_rounds(),
        }
    }
}

/// Markers used to render chat-log lines for a completion model.
///
/// Defaults follow the ChatML convention: a message renders as
/// `<|im_start|>sender\ntext<|im_end|>\n`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptFormatConfig {
    #[serde(default = "default_user_prepend")]
    pub user_prepend: String,

    #[serde(default = "default_user_append")]
    pub user_append: String,

    /// Literal opener emitted after the system prompt, before the chat log.
    /// Empty by default; formats with an explicit transcript header set it.
    #[serde(default)]
    pub log_start: String,

    #[serde(default = "default_line_separator")]
    pub line_separator: String,

    /// Generation stop strings. The first is also the marker appended to
    /// each rendered chat-log line.
    #[serde(default = "default_stop_sequences")]
    pub stop_sequences: Vec<String>,
}

fn default_user_prepend() -> String {
    "<|im_start|>".into()
}
fn default_user_append() -> String {
    "\n".into()
}
fn default_line_separator() -> String {
    "\n".into()
}
fn default_stop_sequences() -> Vec<String> {
    vec!["<|im_end|>".into()]
}

impl Default for PromptFormatConfig {
    fn default() -> Self {
        Self {
            user_prepend: default_user_prepend(),
            user_append: default_user_append(),
            log_start: String::new(),
            line_separator: default_line_separator(),
            stop_sequences: default_stop_sequences(),
        }
    }
}

/// One persona: the name the backend speaks as plus its role/objective
/// templates. Templates may reference `{name}` and `{date}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_persona_name")]
    pub name: String,

    pub role: String,

    pub objective: String,
}

fn default_persona_name() -> String {
    "moot".into()
}

/// The persona for each prompt kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaSet {
    #[serde(default = "default_summary_persona")]
    pub summary: PersonaConfig,

    #[serde(default = "default_proposal_persona")]
    pub proposal: PersonaConfig,
}

fn default_summary_persona() -> PersonaConfig {
    PersonaConfig {
        name: default_persona_name(),
        role: "You are {name}, the archivist of a deliberative assembly. \
               Today is {date}."
            .into(),
        objective: "Read the conversation below and write a concise summary of \
                    what was discussed, the decisions reached, and any points \
                    left unresolved."
            .into(),
    }
}

fn default_proposal_persona() -> PersonaConfig {
    PersonaConfig {
        name: default_persona_name(),
        role: "You are {name}, a participant in a deliberative assembly. \
               Today is {date}."
            .into(),
        objective: "Follow the conversation below and respond helpfully when \
                    addressed, keeping the group focused on its agenda."
            .into(),
    }
}

impl Default for PersonaSet {
    fn default() -> Self {
        Self {
            summary: default_summary_persona(),
            proposal: default_proposal_persona(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path; `:memory:` for an ephemeral store.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

fn default_database_path() -> String {
    "moot.db".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// IPFS-compatible API root (the `/api/v0/add` host)
    #[serde(default = "default_content_api_url")]
    pub api_url: String,

    /// Gateway root for reads (`/ipfs/{cid}`)
    #[serde(default = "default_content_gateway_url")]
    pub gateway_url: String,
}

fn default_content_api_url() -> String {
    "http://127.0.0.1:5001".into()
}
fn default_content_gateway_url() -> String {
    "http://127.0.0.1:8080".into()
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            api_url: default_content_api_url(),
            gateway_url: default_content_gateway_url(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (`moot.toml` in the working
    /// directory, or `MOOT_CONFIG` when set).
    ///
    /// Environment overrides applied after the file:
    /// - `MOOT_BACKEND_ENDPOINT`
    /// - `MOOT_DATABASE_PATH`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("MOOT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("moot.toml"));
        let mut config = Self::load_from(&config_path)?;

        if let Ok(endpoint) = std::env::var("MOOT_BACKEND_ENDPOINT") {
            config.backend.endpoint = endpoint;
        }
        if let Ok(path) = std::env::var("MOOT_DATABASE_PATH") {
            config.storage.database_path = path;
        }

        config.validate()?;
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

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.temperature < 0.0 || self.backend.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "backend.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.backend.top_p <= 0.0 || self.backend.top_p > 1.0 {
            return Err(ConfigError::ValidationError(
                "backend.top_p must be in (0.0, 1.0]".into(),
            ));
        }
        if self.backend.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "backend.top_k must be at least 1".into(),
            ));
        }
        if self.backend.max_prompt_tokens == 0 || self.backend.max_completion_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "backend token budgets must be non-zero".into(),
            ));
        }
        if self.backend.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "backend.max_attempts must be at least 1".into(),
            ));
        }
        if self.backend.max_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "backend.max_rounds must be at least 1".into(),
            ));
        }
        if self.prompt.stop_sequences.is_empty() {
            return Err(ConfigError::ValidationError(
                "prompt.stop_sequences must not be empty".into(),
            ));
        }
        for persona in [&self.personas.summary, &self.personas.proposal] {
            if persona.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "persona name must not be empty".into(),
                ));
            }
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
            backend: BackendConfig::default(),
            prompt: PromptFormatConfig::default(),
            personas: PersonaSet::default(),
            storage: StorageConfig::default(),
            content: ContentConfig::default(),
        }
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
