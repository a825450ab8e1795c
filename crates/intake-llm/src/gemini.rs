//! Gemini REST client.
//!
//! Calls `{base_url}/{model}:generateContent` directly. The API key is read
//! from the environment variable named in configuration and is never logged.

use std::time::Duration;

use async_trait::async_trait;
use intake_core::config::LlmConfig;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::generator::{GenerationRequest, TextGenerator};

/// Generator backed by the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout_ms: u64,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let defaults = LlmConfig::default();
        Self {
            client: Client::new(),
            base_url: defaults.base_url,
            model: model.into(),
            api_key: api_key.into(),
            timeout_ms: defaults.request_timeout_ms,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build a client from configuration, reading the key from
    /// `config.api_key_env`.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LlmError::Unavailable(format!("environment variable {} is not set", config.api_key_env))
            })?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            timeout_ms: config.request_timeout_ms,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let body = GenerateContentRequest::from(request);
        debug!(model = %self.model, prompt_chars = request.prompt.len(), "Calling Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    LlmError::Timeout(self.timeout_ms)
                } else {
                    LlmError::Request(err.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| LlmError::Request(format!("failed to parse Gemini response: {err}")))?;
        extract_text(parsed)
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl From<&GenerationRequest> for GenerateContentRequest {
    fn from(req: &GenerationRequest) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: req.prompt.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: req.max_output_tokens,
                temperature: req.temperature,
                top_p: req.top_p,
                stop_sequences: req.stop_sequences.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text(response: GenerateContentResponse) -> Result<String, LlmError> {
    let text: String = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        Err(LlmError::EmptyResponse)
    } else {
        Ok(text.trim().to_string())
    }
}

/// 429 and quota exhaustion become `RateLimited`; anything else is `Http`.
fn map_http_error(status: StatusCode, body: &str) -> LlmError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .map(|w| match (w.error.status, w.error.message) {
            (Some(s), Some(m)) if !s.is_empty() => format!("{s}: {m}"),
            (_, Some(m)) => m,
            (Some(s), None) => s,
            (None, None) => body.to_string(),
        })
        .unwrap_or_else(|| body.to_string());

    if status == StatusCode::TOO_MANY_REQUESTS || message.to_lowercase().contains("quota") {
        LlmError::RateLimited(message)
    } else {
        LlmError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let req = GenerationRequest::new("Patient: my head hurts")
            .with_max_output_tokens(100)
            .with_stop_sequences(["Doctor:"]);
        let json = serde_json::to_value(GenerateContentRequest::from(&req)).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Patient: my head hurts");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 100);
        assert_eq!(json["generationConfig"]["stopSequences"][0], "Doctor:");
        assert!(json["generationConfig"].get("topP").is_some());
    }

    #[test]
    fn test_empty_stop_sequences_omitted() {
        let json = serde_json::to_value(GenerateContentRequest::from(&GenerationRequest::new("x")))
            .unwrap();
        assert!(json["generationConfig"].get("stopSequences").is_none());
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"1. Where? "},{"text":"\n2. When?"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(extract_text(parsed).unwrap(), "1. Where? \n2. When?");
    }

    #[test]
    fn test_extract_text_empty_candidates() {
        let parsed: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(extract_text(parsed), Err(LlmError::EmptyResponse));
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_text(parsed), Err(LlmError::EmptyResponse));
    }

    #[test]
    fn test_map_http_error_rate_limit() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = map_http_error(StatusCode::TOO_MANY_REQUESTS, body);
        assert_eq!(
            err,
            LlmError::RateLimited("RESOURCE_EXHAUSTED: Resource has been exhausted".into())
        );
    }

    #[test]
    fn test_map_http_error_quota_message() {
        let err = map_http_error(StatusCode::FORBIDDEN, "Quota exceeded for project");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_map_http_error_other() {
        let err = map_http_error(StatusCode::BAD_REQUEST, "bad things");
        assert_eq!(
            err,
            LlmError::Http {
                status: 400,
                message: "bad things".into()
            }
        );
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = LlmConfig {
            api_key_env: "INTAKE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(
            GeminiClient::from_config(&config),
            Err(LlmError::Unavailable(_))
        ));
    }

    #[test]
    fn test_endpoint_and_debug_hide_key() {
        let client = GeminiClient::new("secret-key", "gemini-1.5-flash")
            .with_base_url("http://localhost:9999/models/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/models/gemini-1.5-flash:generateContent"
        );
        assert!(!format!("{client:?}").contains("secret-key"));
    }
}
