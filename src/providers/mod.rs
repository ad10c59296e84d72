//! Provider module for Parley
//!
//! This module contains the inference backend abstraction and the Ollama
//! implementation.

pub mod base;
pub mod ollama;

pub use base::{CompletionResponse, Message, ModelInfo, Provider, TokenUsage};
pub use ollama::OllamaProvider;

use crate::config::Config;
use crate::error::Result;

/// Create the provider described by the configuration
///
/// # Errors
///
/// Returns error if provider initialization fails
pub fn create_provider(config: &Config) -> Result<Box<dyn Provider>> {
    Ok(Box::new(OllamaProvider::new(config.ollama.clone())?))
}
