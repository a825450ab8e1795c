use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use intake_core::config::LlmConfig;
use tracing::warn;

use crate::error::LlmError;
use crate::generator::{GenerationRequest, TextGenerator};

/// Hard ceiling on any single backoff.
const BACKOFF_CEILING: Duration = Duration::from_secs(60);

/// Timeout and retry settings for collaborator calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Deadline for one attempt.
    pub timeout: Duration,
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Backoff before retry `n` is `base * 2^n` plus up to `base` of jitter.
    pub backoff_base: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.request_timeout_ms),
            max_attempts: config.max_retries.max(1),
            backoff_base: Duration::from_secs(1),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Delay before the given retry attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base_ms = self.backoff_base.as_millis() as u64;
        let exp_ms = base_ms.saturating_mul(1u64 << attempt.min(20));
        let jitter_ms = if base_ms == 0 {
            0
        } else {
            rand::random_range(0..=base_ms)
        };
        Duration::from_millis(exp_ms.saturating_add(jitter_ms))
            .min(self.max_backoff)
            .min(BACKOFF_CEILING)
    }
}

/// Wraps a generator with a per-attempt timeout and rate-limit retries.
///
/// Timeouts and non-rate-limit errors are returned immediately so the caller
/// can take its fallback path.
pub struct ResilientGenerator {
    inner: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl ResilientGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl TextGenerator for ResilientGenerator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let timeout_ms = self.policy.timeout.as_millis() as u64;
        let mut last_error = LlmError::EmptyResponse;

        for attempt in 0..self.policy.max_attempts {
            if attempt > 0 {
                let delay = self.policy.backoff(attempt);
                warn!(
                    generator = self.inner.name(),
                    attempt = attempt + 1,
                    max_attempts = self.policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
            }

            let outcome = tokio::time::timeout(self.policy.timeout, self.inner.generate(request)).await;
            match outcome {
                Err(_) => return Err(LlmError::Timeout(timeout_ms)),
                Ok(Ok(text)) if text.trim().is_empty() => return Err(LlmError::EmptyResponse),
                Ok(Ok(text)) => return Ok(text.trim().to_string()),
                Ok(Err(err)) if err.is_retryable() => last_error = err,
                Ok(Err(err)) => return Err(err),
            }
        }

        Err(last_error)
    }
}
