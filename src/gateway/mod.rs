//! Model gateway.
//!
//! Thin wrapper around an Ollama-style model service. The retry/timeout
//! policy lives here; everything downstream sees per-call results only.

pub mod ollama;

pub use ollama::{ChatModel, EmbeddingModel, GatewayConfig, GatewayError, OllamaClient};
