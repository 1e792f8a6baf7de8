//! Mock backend for testing
//!
//! Provides a scripted completion backend for unit and integration tests
//! without a running LLM server. Responses (and failures) are consumed in
//! FIFO order, one per `complete` call.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::{CompletionOptions, LlmBackend, Message};

type ScriptEntry = std::result::Result<String, String>;

/// Scripted mock LLM backend
#[derive(Clone, Default)]
pub struct MockBackend {
    script: Arc<Mutex<VecDeque<ScriptEntry>>>,
    calls: Arc<AtomicUsize>,
    /// Whether health_check should return true
    pub healthy: bool,
}

impl MockBackend {
    /// Create a new mock backend (healthy, empty script)
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            healthy: true,
        }
    }

    /// Create a mock that answers each call with the next response in order
    pub fn with_responses(responses: &[&str]) -> Self {
        let mock = Self::new();
        for response in responses {
            mock.push_response(response);
        }
        mock
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Queue a successful response
    pub fn push_response(&self, response: &str) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(response.to_string()));
        }
    }

    /// Queue a failure
    pub fn push_failure(&self, message: &str) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(message.to_string()));
        }
    }

    /// Number of `complete` calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn complete(&self, _messages: &[Message], _options: &CompletionOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let entry = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());

        match entry {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(Error::InvalidData(message)),
            None => Err(Error::InvalidData("mock script exhausted".to_string())),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
