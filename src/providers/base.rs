//! Base provider trait and common types for Parley
//!
//! The provider is the boundary to the inference backend: it takes an
//! ordered list of role-tagged messages and returns generated text or a
//! typed failure. Everything behind it is external.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message structure for conversation
///
/// Represents one role-tagged entry in the context sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (user, assistant, ...)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Creates a new message with an arbitrary role
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use parley::providers::Message;
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(crate::storage::ROLE_USER, content)
    }

    /// Creates a new assistant message
    ///
    /// # Examples
    ///
    /// ```
    /// use parley::providers::Message;
    ///
    /// let msg = Message::assistant("Hello, user!");
    /// assert_eq!(msg.role, "assistant");
    /// ```
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(crate::storage::ROLE_ASSISTANT, content)
    }
}

/// Token usage information from a completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    pub completion_tokens: usize,
    /// Total tokens used (prompt + completion)
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    ///
    /// # Examples
    ///
    /// ```
    /// use parley::providers::TokenUsage;
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Reply from the backend
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated text
    pub content: String,
    /// Token usage, when the backend reports it
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Reply without usage data
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }

    /// Reply with usage data
    pub fn with_usage(content: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            content: content.into(),
            usage: Some(usage),
        }
    }
}

/// A model installed on the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier (e.g. "llama3.2:latest")
    pub name: String,
    /// Size on disk in bytes, when reported
    pub size: u64,
    /// Last modification time as reported by the backend
    pub modified_at: String,
}

/// Inference backend contract
///
/// The model is passed on every call rather than held as provider state, so
/// a model change never mutates a live provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate a reply for `messages` using `model`
    ///
    /// One call per turn; no retries.
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::Inference` if the backend is unreachable or
    /// reports a failure.
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<CompletionResponse>;

    /// List models available on the backend
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::Inference` if the backend cannot be queried.
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// Ask the backend to release a loaded model
    ///
    /// Best-effort: used on shutdown and before switching models.
    async fn unload_model(&self, model: &str) -> Result<()>;

    /// Verify the backend is reachable
    ///
    /// The default implementation lists models and discards the result.
    async fn health_check(&self) -> Result<()> {
        self.list_models().await.map(|_| ())
    }
}
