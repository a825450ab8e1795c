//! Error types for collaborator calls.

use intake_core::IntakeError;

/// Errors from a generative-text or transcription collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("request timed out after {0} ms")]
    Timeout(u64),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("collaborator returned an empty response")]
    EmptyResponse,
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

impl LlmError {
    /// Only rate limiting is worth retrying; everything else falls back.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::RateLimited(_))
    }
}

impl From<LlmError> for IntakeError {
    fn from(err: LlmError) -> Self {
        IntakeError::UpstreamTimeout(err.to_string())
    }
}
