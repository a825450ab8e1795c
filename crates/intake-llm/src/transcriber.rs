//! Server-side transcription seam.
//!
//! Browsers normally transcribe speech themselves and send text. Uploaded
//! audio is handed to a [`Transcriber`] unchanged.

use async_trait::async_trait;

use crate::error::LlmError;

/// Speech-to-text collaborator.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe encoded audio bytes. `content_type` is the upload's MIME
    /// type when the client sent one.
    async fn transcribe(
        &self,
        audio: &[u8],
        content_type: Option<&str>,
        language: &str,
    ) -> Result<String, LlmError>;
}

/// Transcriber used when no speech-to-text backend is configured.
#[derive(Debug, Clone, Default)]
pub struct UnavailableTranscriber;

#[async_trait]
impl Transcriber for UnavailableTranscriber {
    async fn transcribe(
        &self,
        _audio: &[u8],
        _content_type: Option<&str>,
        _language: &str,
    ) -> Result<String, LlmError> {
        Err(LlmError::Unavailable(
            "server-side transcription is not configured".to_string(),
        ))
    }
}

/// Returns a fixed transcript for any non-empty audio.
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    text: String,
}

impl MockTranscriber {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        audio: &[u8],
        _content_type: Option<&str>,
        _language: &str,
    ) -> Result<String, LlmError> {
        if audio.is_empty() {
            return Err(LlmError::Request("cannot transcribe empty audio".to_string()));
        }
        tracing::debug!(bytes = audio.len(), "Mock transcription generated");
        Ok(self.text.clone())
    }
}
