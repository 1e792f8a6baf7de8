//! Gated, retrying completion client
//!
//! Wraps an `LlmClient` with the two policies every completion call in the
//! pipeline goes through:
//!
//! - a process-wide cap on concurrently in-flight calls; at capacity a new
//!   call suspends until any one in-flight call settles
//! - exponential backoff retry with jitter; on exhaustion the last error
//!   propagates unchanged
//!
//! Identical concurrent calls are not de-duplicated.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::warn;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::{CompletionOptions, LlmBackend, LlmClient, Message};

/// Retry behavior for completion calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `attempt` (1-based):
    /// `base * 2^(attempt-1) + jitter(<= 10% of base)`, capped at `max_delay`.
    fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let exp_ms = base_ms * 2f64.powi(attempt.saturating_sub(1) as i32);
        let jitter_ms = base_ms * 0.10 * clock_jitter();
        let capped_ms = (exp_ms + jitter_ms).min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }
}

/// Pseudo-random factor in [0, 1) derived from the clock, so the retry path
/// needs no rand dependency.
fn clock_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

/// Bounded-concurrency, retrying wrapper around one LLM client.
pub struct RetryingCallClient {
    backend: LlmClient,
    permits: Arc<Semaphore>,
    policy: RetryPolicy,
}

impl RetryingCallClient {
    pub fn new(backend: LlmClient, max_concurrent: usize, policy: RetryPolicy) -> Self {
        Self {
            backend,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            policy,
        }
    }

    /// Build the client from the LLM configuration knobs.
    pub fn from_config(backend: LlmClient, config: &LlmConfig) -> Self {
        Self::new(
            backend,
            config.max_concurrent,
            RetryPolicy {
                max_retries: config.max_retries,
                base_delay: config.base_delay,
                max_delay: config.max_delay,
            },
        )
    }

    /// The wrapped client.
    pub fn backend(&self) -> &LlmClient {
        &self.backend
    }

    /// Run one completion call under the gate. The permit is held across
    /// retries: a call counts as in-flight until it settles for good.
    pub async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::InvalidData("completion gate closed".to_string()))?;

        let mut attempt: u32 = 0;
        loop {
            match self.backend.complete(messages, options).await {
                Ok(text) => return Ok(text),
                Err(err) if attempt < self.policy.max_retries => {
                    attempt += 1;
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        attempt,
                        max_retries = self.policy.max_retries,
                        error = %err,
                        "completion call failed, retrying in {:?}",
                        delay
                    );
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
