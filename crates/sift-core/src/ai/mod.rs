//! Pluggable LLM backend abstraction
//!
//! This module provides a backend-agnostic interface for the one LLM
//! operation the pipeline needs: a completion call that can be forced into a
//! structured output schema.
//!
//! # Architecture
//!
//! - `LlmBackend` trait: defines the completion interface
//! - `LlmClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `AnthropicBackend`, `MockBackend`
//! - `RetryingCallClient`: concurrency gate + retry wrapper around a client

pub mod anthropic;
mod gate;
mod mock;

pub use anthropic::AnthropicBackend;
pub use gate::{RetryPolicy, RetryingCallClient};
pub use mock::MockBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::Result;

/// Message in a completion conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String, // "user", "assistant"
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: text.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: text.into(),
        }
    }
}

/// Options for one completion call.
///
/// When `output_schema` is set, the backend forces the model to answer
/// through a tool named `forced_schema_name` whose input schema is the given
/// JSON Schema, and the returned string is the tool input serialized as JSON.
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub system_prompt: Option<String>,
    pub output_schema: Option<serde_json::Value>,
    pub forced_schema_name: Option<String>,
}

/// Trait defining the interface for all LLM backends
///
/// Backends must be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Run one completion call and return the model's text (or the forced
    /// schema payload serialized as JSON when a schema is set)
    async fn complete(&self, messages: &[Message], options: &CompletionOptions) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete LLM client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum LlmClient {
    /// Anthropic-compatible backend (HTTP API)
    Anthropic(AnthropicBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl LlmClient {
    /// Create a client from the LLM configuration
    pub fn from_config(config: &LlmConfig) -> Self {
        LlmClient::Anthropic(AnthropicBackend::new(&config.host, &config.model))
    }

    /// Create a mock backend for testing
    pub fn mock(backend: MockBackend) -> Self {
        LlmClient::Mock(backend)
    }
}

#[async_trait]
impl LlmBackend for LlmClient {
    async fn complete(&self, messages: &[Message], options: &CompletionOptions) -> Result<String> {
        match self {
            LlmClient::Anthropic(b) => b.complete(messages, options).await,
            LlmClient::Mock(b) => b.complete(messages, options).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            LlmClient::Anthropic(b) => b.health_check().await,
            LlmClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            LlmClient::Anthropic(b) => b.model(),
            LlmClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            LlmClient::Anthropic(b) => b.host(),
            LlmClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let user_msg = Message::user("Hello");
        assert_eq!(user_msg.role, "user");

        let assistant_msg = Message::assistant("Hi there");
        assert_eq!(assistant_msg.role, "assistant");
    }

    #[test]
    fn test_llm_client_mock() {
        let client = LlmClient::mock(MockBackend::new());
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = LlmClient::mock(MockBackend::new());
        assert!(client.health_check().await);
    }
}
