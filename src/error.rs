//! Error types for Parley
//!
//! This module defines the error taxonomy used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Parley operations
///
/// Every failure is handled at the point of the interactive operation that
/// triggered it and converted to a user-visible message. Only a storage
/// failure during startup is fatal to the process.
#[derive(Error, Debug)]
pub enum ParleyError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The message store could not be opened, read, or written
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The inference backend was unreachable or returned a failure
    #[error("Inference error: {0}")]
    Inference(String),

    /// A session or selection index does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Export was requested for a session with no messages
    #[error("Session has no messages: {0}")]
    EmptySession(String),

    /// Malformed interactive command or argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The user interrupted the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ParleyError {
    /// Wrap a storage-engine failure with the operation that triggered it
    pub(crate) fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        Self::StorageUnavailable(format!("{}: {}", context, err))
    }
}

/// Result type alias for Parley operations
///
/// Uses `anyhow::Error` so callers can attach context; typed failures are
/// recovered with `downcast_ref::<ParleyError>()`.
pub type Result<T> = anyhow::Result<T>;

/// Return the typed error behind an `anyhow::Error`, if there is one
pub fn as_parley_error(err: &anyhow::Error) -> Option<&ParleyError> {
    err.downcast_ref::<ParleyError>()
}
