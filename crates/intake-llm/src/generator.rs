use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::LlmError;

// =============================================================================
// Request
// =============================================================================

/// One text-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub stop_sequences: Vec<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_output_tokens: 256,
            temperature: 0.7,
            top_p: 0.95,
            stop_sequences: Vec::new(),
        }
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_stop_sequences<I, S>(mut self, stops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_sequences = stops.into_iter().map(Into::into).collect();
        self
    }
}

// =============================================================================
// Trait
// =============================================================================

/// A generative-text collaborator.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Generate text for a prompt.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError>;
}

// =============================================================================
// Disabled
// =============================================================================

/// Generator that always reports itself unavailable, forcing every caller
/// onto its deterministic fallback.
#[derive(Debug, Clone, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String, LlmError> {
        Err(LlmError::Unavailable("text generation is disabled".to_string()))
    }
}

// =============================================================================
// Mock implementation
// =============================================================================

/// One scripted mock outcome.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Fail(LlmError),
}

/// Scripted generator for tests.
///
/// Replies are consumed in order; once the script is exhausted the default
/// reply repeats. An optional delay simulates a slow upstream.
#[derive(Debug)]
pub struct MockGenerator {
    script: Mutex<VecDeque<MockReply>>,
    default_reply: MockReply,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl MockGenerator {
    fn with_default(default_reply: MockReply) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_reply,
            delay: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Always reply with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_default(MockReply::Text(text.into()))
    }

    /// Always fail with `err`.
    pub fn failing(err: LlmError) -> Self {
        Self::with_default(MockReply::Fail(err))
    }

    /// Sleep for `delay` before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a reply ahead of the default.
    pub fn then(self, reply: MockReply) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
        self
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompt of the most recent call.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_request
            .lock()
            .ok()
            .and_then(|r| r.as_ref().map(|r| r.prompt.clone()))
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self
            .script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| self.default_reply.clone());
        match reply {
            MockReply::Text(text) => Ok(text),
            MockReply::Fail(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = GenerationRequest::new("hello")
            .with_max_output_tokens(100)
            .with_temperature(0.3)
            .with_top_p(0.9)
            .with_stop_sequences(["Patient:", "Doctor:"]);
        assert_eq!(req.prompt, "hello");
        assert_eq!(req.max_output_tokens, 100);
        assert!((req.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(req.stop_sequences, vec!["Patient:", "Doctor:"]);
    }

    #[tokio::test]
    async fn test_disabled_generator_is_unavailable() {
        let result = DisabledGenerator.generate(&GenerationRequest::new("x")).await;
        assert!(matches!(result, Err(LlmError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_mock_replies_in_script_order() {
        let mock = MockGenerator::replying("default")
            .then(MockReply::Fail(LlmError::RateLimited("quota".into())))
            .then(MockReply::Text("second".into()));
        let req = GenerationRequest::new("prompt");

        assert!(matches!(mock.generate(&req).await, Err(LlmError::RateLimited(_))));
        assert_eq!(mock.generate(&req).await.unwrap(), "second");
        assert_eq!(mock.generate(&req).await.unwrap(), "default");
        assert_eq!(mock.calls(), 3);
        assert_eq!(mock.last_prompt().as_deref(), Some("prompt"));
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let mock = MockGenerator::failing(LlmError::EmptyResponse);
        let result = mock.generate(&GenerationRequest::new("p")).await;
        assert_eq!(result, Err(LlmError::EmptyResponse));
    }
}
