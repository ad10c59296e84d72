//! Application context
//!
//! Everything a command needs, loaded once at startup and passed down
//! explicitly: configuration (including the active model), the message
//! store, and the inference provider. A model change produces a new
//! context on restart instead of mutating this one.

use crate::config::Config;
use crate::error::Result;
use crate::providers::{create_provider, Provider};
use crate::storage::SqliteStorage;

/// Shared state for one run of the application
pub struct AppContext {
    /// Effective configuration
    pub config: Config,
    /// Where the configuration document lives (rewritten on model change)
    pub config_path: String,
    /// Conversation memory store
    pub storage: SqliteStorage,
    /// Inference backend
    pub provider: Box<dyn Provider>,
}

impl AppContext {
    /// Open storage and build the provider described by `config`
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::StorageUnavailable` when the database cannot be
    /// initialized.
    pub fn from_config(config: Config, config_path: impl Into<String>) -> Result<Self> {
        let storage = match &config.storage.database_path {
            Some(path) => SqliteStorage::new_with_path(path.clone())?,
            None => SqliteStorage::new()?,
        };
        let provider = create_provider(&config)?;
        Ok(Self::new(config, config_path, storage, provider))
    }

    /// Assemble a context from already-built parts
    pub fn new(
        config: Config,
        config_path: impl Into<String>,
        storage: SqliteStorage,
        provider: Box<dyn Provider>,
    ) -> Self {
        Self {
            config,
            config_path: config_path.into(),
            storage,
            provider,
        }
    }

    /// The model used for new turns
    pub fn model(&self) -> &str {
        &self.config.model
    }
}
