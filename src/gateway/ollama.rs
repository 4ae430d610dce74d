//! Ollama chat and embeddings client.
//!
//! One request per call, no streaming. Transient failures (connection,
//! timeout, 5xx) are retried up to the configured attempt budget; anything
//! else fails the call immediately. Calls are independent, so the client
//! can be invoked concurrently without shared mutable state.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure modes of a single gateway call.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("cannot connect to model service at {0}")]
    Unreachable(String),

    #[error("model request timed out after {0}s")]
    Timeout(u64),

    #[error("model service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model call failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: usize, last_error: String },

    #[error("model response contained no usable text")]
    EmptyContent,

    #[error("failed to decode model response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Whether a retry could plausibly succeed.
    fn is_transient(&self) -> bool {
        match self {
            GatewayError::Unreachable(_) | GatewayError::Timeout(_) => true,
            GatewayError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Gateway settings, normally sourced from config and CLI flags.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub ollama_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub retries: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2:latest".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            temperature: 0.1,
            timeout_seconds: 30,
            retries: 3,
        }
    }
}

/// Text generation seam. The coordinator only needs this one call, which
/// keeps the fan-out testable with canned replies.
pub trait ChatModel: Send + Sync {
    fn generate(
        &self,
        system_role: &str,
        user_prompt: &str,
    ) -> impl Future<Output = Result<String, GatewayError>> + Send;
}

/// Embedding seam used by the retention store's batch step.
pub trait EmbeddingModel: Send + Sync {
    fn embed(&self, input: &str) -> impl Future<Output = Result<Vec<f32>, GatewayError>> + Send;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

/// Client for the Ollama HTTP API.
pub struct OllamaClient {
    config: GatewayConfig,
    http: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: GatewayConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, http }
    }

    async fn chat_once(
        &self,
        system_role: &str,
        user_prompt: &str,
    ) -> Result<String, GatewayError> {
        let url = format!("{}/api/chat", self.config.ollama_url);

        let request = ChatRequest {
            model: self.config.chat_model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_role.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let content = chat_response.message.content;
        if content.trim().is_empty() {
            return Err(GatewayError::EmptyContent);
        }

        Ok(content)
    }

    async fn embed_once(&self, input: &str) -> Result<Vec<f32>, GatewayError> {
        let url = format!("{}/api/embeddings", self.config.ollama_url);

        let request = EmbeddingsRequest {
            model: self.config.embedding_model.clone(),
            prompt: input.to_string(),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if parsed.embedding.is_empty() {
            return Err(GatewayError::EmptyContent);
        }

        Ok(parsed.embedding)
    }

    fn classify_send_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.config.timeout_seconds)
        } else if e.is_connect() {
            GatewayError::Unreachable(self.config.ollama_url.clone())
        } else {
            GatewayError::InvalidResponse(e.to_string())
        }
    }
}

impl ChatModel for OllamaClient {
    async fn generate(&self, system_role: &str, user_prompt: &str) -> Result<String, GatewayError> {
        let attempts = self.config.retries.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            debug!("Chat call attempt {}/{}", attempt, attempts);
            match self.chat_once(system_role, user_prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() => {
                    warn!("Transient gateway failure (attempt {}): {}", attempt, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(GatewayError::RetriesExhausted {
            attempts,
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}

impl EmbeddingModel for OllamaClient {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, GatewayError> {
        let attempts = self.config.retries.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.embed_once(input).await {
                Ok(vector) => return Ok(vector),
                Err(e) if e.is_transient() => {
                    warn!("Transient embedding failure (attempt {}): {}", attempt, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(GatewayError::RetriesExhausted {
            attempts,
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}
