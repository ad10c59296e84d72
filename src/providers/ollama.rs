//! Ollama provider implementation for Parley
//!
//! Talks to a local or remote Ollama server over its HTTP API:
//! `/api/chat` for completions, `/api/tags` for model listing and
//! `/api/generate` with `keep_alive: 0` to unload a model.

use crate::config::OllamaConfig;
use crate::error::{ParleyError, Result};
use crate::providers::{CompletionResponse, Message, ModelInfo, Provider, TokenUsage};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API provider
///
/// # Examples
///
/// ```no_run
/// use parley::config::OllamaConfig;
/// use parley::providers::{Message, OllamaProvider, Provider};
///
/// # async fn example() -> parley::error::Result<()> {
/// let provider = OllamaProvider::new(OllamaConfig::default())?;
/// let reply = provider
///     .complete("llama3.2:latest", &[Message::user("Hello!")])
///     .await?;
/// println!("{}", reply.content);
/// # Ok(())
/// # }
/// ```
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

/// Request structure for `/api/chat`
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

/// Message structure in Ollama responses
#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[allow(dead_code)]
    role: String,
    #[serde(default)]
    content: String,
}

/// Response structure from `/api/chat`
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

/// Response from `/api/tags`
#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModelTag>,
}

/// Model metadata from `/api/tags`
#[derive(Debug, Deserialize)]
struct OllamaModelTag {
    name: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    modified_at: String,
}

/// Request for `/api/generate` that only adjusts the keep-alive window
#[derive(Debug, Serialize)]
struct OllamaKeepAliveRequest<'a> {
    model: &'a str,
    keep_alive: u64,
}

/// Error body Ollama returns alongside non-2xx statuses
#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use parley::config::OllamaConfig;
    /// use parley::providers::OllamaProvider;
    ///
    /// let provider = OllamaProvider::new(OllamaConfig::default());
    /// assert!(provider.is_ok());
    /// ```
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ParleyError::Inference(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(host = %config.host, "Initialized Ollama provider");
        Ok(Self { client, config })
    }

    /// Get the configured Ollama host
    pub fn host(&self) -> &str {
        &self.config.host
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.host.trim_end_matches('/'), path)
    }

    /// Turn a non-success response into an inference error
    async fn error_from_response(response: reqwest::Response) -> ParleyError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<OllamaErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        tracing::error!("Ollama returned error {}: {}", status, detail);
        ParleyError::Inference(format!("Ollama returned error {}: {}", status, detail))
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<CompletionResponse> {
        let request = OllamaChatRequest {
            model,
            messages,
            stream: false,
        };

        tracing::debug!(model, messages = messages.len(), "Sending Ollama chat request");

        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Ollama request failed: {}", e);
                ParleyError::Inference(format!("Ollama request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await.into());
        }

        let body: OllamaChatResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Ollama response: {}", e);
            ParleyError::Inference(format!("Failed to parse Ollama response: {}", e))
        })?;

        tracing::debug!(
            done = body.done,
            prompt_tokens = body.prompt_eval_count,
            completion_tokens = body.eval_count,
            "Ollama response received"
        );

        Ok(if body.prompt_eval_count > 0 || body.eval_count > 0 {
            CompletionResponse::with_usage(
                body.message.content,
                TokenUsage::new(body.prompt_eval_count, body.eval_count),
            )
        } else {
            CompletionResponse::new(body.message.content)
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to fetch Ollama models: {}", e);
                ParleyError::Inference(format!("Failed to connect to Ollama server: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await.into());
        }

        let tags: OllamaTagsResponse = response.json().await.map_err(|e| {
            ParleyError::Inference(format!("Failed to parse Ollama response: {}", e))
        })?;

        let models: Vec<ModelInfo> = tags
            .models
            .into_iter()
            .map(|tag| ModelInfo {
                name: tag.name,
                size: tag.size,
                modified_at: tag.modified_at,
            })
            .collect();
        tracing::debug!("Fetched {} models from Ollama", models.len());
        Ok(models)
    }

    async fn unload_model(&self, model: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&OllamaKeepAliveRequest {
                model,
                keep_alive: 0,
            })
            .send()
            .await
            .map_err(|e| ParleyError::Inference(format!("Failed to stop model: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await.into());
        }
        tracing::info!(model, "Unloaded Ollama model");
        Ok(())
    }
}
