//! Configuration management for Parley
//!
//! Configuration is a small YAML document read once at startup. The only
//! value the application itself rewrites is the active model; a model change
//! is reported as a [`ConfigChange`] and takes effect after a restart, never
//! by mutating live state.

use crate::error::{ParleyError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Parley
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Active model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Ollama backend configuration
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Message store configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Chat and presentation limits
    #[serde(default)]
    pub chat: ChatConfig,
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            ollama: OllamaConfig::default(),
            storage: StorageConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Message store configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file; defaults to `memory.db` in the platform data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

/// Chat behavior and listing limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Prior user/assistant pairs sent with each new turn
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Maximum search results shown
    #[serde(default = "default_search_page_size")]
    pub search_page_size: usize,

    /// Maximum sessions shown by the session list
    #[serde(default = "default_session_list_limit")]
    pub session_list_limit: usize,

    /// Maximum sessions offered by the export picker
    #[serde(default = "default_export_list_limit")]
    pub export_list_limit: usize,

    /// Directory export files are written to
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

fn default_context_window() -> usize {
    5
}

fn default_search_page_size() -> usize {
    10
}

fn default_session_list_limit() -> usize {
    20
}

fn default_export_list_limit() -> usize {
    10
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            search_page_size: default_search_page_size(),
            session_list_limit: default_session_list_limit(),
            export_list_limit: default_export_list_limit(),
            export_dir: default_export_dir(),
        }
    }
}

/// Outcome of a request to change persisted configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    /// The requested value was already active
    Unchanged,
    /// The new model was saved; the process must restart to use it
    RestartRequired {
        /// Model that was active
        previous: String,
        /// Model that will be active after restart
        current: String,
    },
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = Self::load_file_or_default(path)?;
        config.apply_env_vars();
        config.apply_cli_overrides(cli);
        Ok(config)
    }

    fn load_file_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Ok(Self::default())
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ParleyError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ParleyError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(model) = std::env::var("PARLEY_MODEL") {
            self.model = model;
        }

        if let Ok(host) = std::env::var("PARLEY_OLLAMA_HOST") {
            self.ollama.host = host;
        }

        if let Ok(db) = std::env::var(crate::storage::HISTORY_DB_ENV) {
            self.storage.database_path = Some(PathBuf::from(db));
        }

        if let Ok(window) = std::env::var("PARLEY_CONTEXT_WINDOW") {
            if let Ok(value) = window.parse() {
                self.chat.context_window = value;
            } else {
                tracing::warn!("Invalid PARLEY_CONTEXT_WINDOW: {}", window);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(db) = &cli.db {
            self.storage.database_path = Some(PathBuf::from(db));
        }
        if let Some(model) = &cli.model {
            self.model = model.clone();
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::Config` naming the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ParleyError::Config("model must not be empty".into()).into());
        }

        let host = self.ollama.host.trim();
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(ParleyError::Config(format!(
                "ollama.host must start with http:// or https://, got '{}'",
                self.ollama.host
            ))
            .into());
        }

        if self.ollama.timeout_seconds == 0 {
            return Err(ParleyError::Config("ollama.timeout_seconds must be > 0".into()).into());
        }

        let limits = [
            ("chat.context_window", self.chat.context_window),
            ("chat.search_page_size", self.chat.search_page_size),
            ("chat.session_list_limit", self.chat.session_list_limit),
            ("chat.export_list_limit", self.chat.export_list_limit),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(ParleyError::Config(format!("{} must be > 0", name)).into());
        }

        Ok(())
    }

    /// Write the configuration document to `path`
    pub fn save(&self, path: &str) -> Result<()> {
        let path = Path::new(path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)
            .map_err(|e| ParleyError::Config(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }

    /// Persist `model` as the active model in the document at `path`
    ///
    /// Only the model field changes; values that came from environment or
    /// CLI overrides are not written back. The running configuration is left
    /// untouched: a `RestartRequired` result tells the caller to reload.
    pub fn persist_model(&self, path: &str, model: &str) -> Result<ConfigChange> {
        let model = model.trim();
        if model.is_empty() {
            return Err(ParleyError::InvalidInput("model must not be empty".into()).into());
        }
        if model == self.model {
            return Ok(ConfigChange::Unchanged);
        }

        let mut document = Self::load_file_or_default(path)?;
        document.model = model.to_string();
        document.save(path)?;

        tracing::info!(previous = %self.model, current = model, "Saved model change");
        Ok(ConfigChange::RestartRequired {
            previous: self.model.clone(),
            current: model.to_string(),
        })
    }
}
