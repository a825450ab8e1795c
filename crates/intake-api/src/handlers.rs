//! HTTP request handlers for all API endpoints.
//!
//! Each handler extracts parameters, delegates to `ConversationService`, and
//! returns JSON responses. Handlers do not hold locks across await points.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use intake_conversation::REPEAT_PROMPT;
use intake_core::{EmotionResult, EmotionTimelineEntry, Session, Speaker, SummaryReport};
use intake_llm::LlmError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    pub language: Option<String>,
    pub patient_info: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuestionRequest {
    pub text: Option<String>,
    pub language: Option<String>,
    pub session_id: Option<String>,
    pub speaker: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub success: bool,
    pub session_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateQuestionResponse {
    pub success: bool,
    pub transcription: String,
    pub follow_up_question: String,
    pub session_id: Option<Uuid>,
    pub conversation_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion_analysis: Option<EmotionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_summary: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: SummaryReport,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: Session,
    pub emotion_timeline: Vec<EmotionTimelineEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndSessionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessAudioResponse {
    pub success: bool,
    pub transcription: String,
    pub follow_up_question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

// =============================================================================
// Helpers
// =============================================================================

/// Session ids arrive as opaque strings. Anything that is not a UUID cannot
/// name a live session, so it is reported the same way as an unknown id.
fn parse_session_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::SessionNotFound(format!("Session not found: {raw}")))
}

fn parse_speaker(raw: Option<&str>) -> Result<Speaker, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Speaker::Patient),
        Some(s) => Speaker::parse(&s.to_ascii_lowercase()).ok_or_else(|| {
            ApiError::BadRequest(format!("Unknown speaker '{s}', expected 'patient' or 'doctor'"))
        }),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/start-session
///
/// The body is optional; an empty body opens a session with the default
/// language and no patient info.
pub async fn start_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StartSessionResponse>, ApiError> {
    let request: StartSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        StartSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))?
    };

    let session_id = state
        .service
        .start_session(request.language.as_deref(), request.patient_info)?;
    info!(%session_id, "Consultation session started");

    Ok(Json(StartSessionResponse {
        success: true,
        session_id,
        message: "New consultation session started".to_string(),
    }))
}

/// POST /api/generate-question
pub async fn generate_question(
    State(state): State<AppState>,
    payload: Result<Json<GenerateQuestionRequest>, JsonRejection>,
) -> Result<Json<GenerateQuestionResponse>, ApiError> {
    let Json(request) = payload?;
    let text = request
        .text
        .ok_or_else(|| ApiError::BadRequest("No text provided".to_string()))?;
    let speaker = parse_speaker(request.speaker.as_deref())?;
    let session_id = request
        .session_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_session_id)
        .transpose()?;

    let outcome = state
        .service
        .generate_question(&text, request.language.as_deref(), session_id, speaker)
        .await?;

    Ok(Json(GenerateQuestionResponse {
        success: true,
        transcription: outcome.transcription,
        follow_up_question: outcome.follow_up_question,
        session_id: outcome.session_id,
        conversation_length: outcome.conversation_length,
        emotion_analysis: outcome.emotion_analysis,
        conversation_summary: outcome.conversation_summary,
    }))
}

/// GET /api/summarize-conversation/{session_id}
pub async fn summarize_conversation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let id = parse_session_id(&session_id)?;
    let report = state.service.summarize(id).await?;
    Ok(Json(SummaryResponse {
        success: true,
        report,
    }))
}

/// GET /api/get-session/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let id = parse_session_id(&session_id)?;
    let view = state.service.session_view(id).await?;
    Ok(Json(SessionResponse {
        success: true,
        session: view.session,
        emotion_timeline: view.emotion_timeline,
        summary: view.summary,
    }))
}

/// DELETE /api/session/{session_id}
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<EndSessionResponse>, ApiError> {
    let id = parse_session_id(&session_id)?;
    state.service.end_session(id)?;
    info!(session_id = %id, "Consultation session ended");
    Ok(Json(EndSessionResponse {
        success: true,
        message: "Session ended".to_string(),
    }))
}

/// POST /api/process-audio
///
/// Multipart form with an `audio` part and an optional `language` part.
pub async fn process_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProcessAudioResponse>, ApiError> {
    let mut audio: Option<(Bytes, Option<String>)> = None;
    let mut language: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                let content_type = field.content_type().map(str::to_string);
                audio = Some((field.bytes().await?, content_type));
            }
            Some("language") => language = Some(field.text().await?),
            _ => {}
        }
    }

    let (bytes, content_type) =
        audio.ok_or_else(|| ApiError::BadRequest("No audio file provided".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("No audio file selected".to_string()));
    }

    let language = language
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| state.config.session.default_language.clone());

    let transcription = match state
        .transcriber
        .transcribe(&bytes, content_type.as_deref(), &language)
        .await
    {
        Ok(text) => text,
        Err(LlmError::Unavailable(msg)) => return Err(ApiError::ServiceUnavailable(msg)),
        Err(e) => {
            warn!(error = %e, bytes = bytes.len(), "Transcription failed");
            String::new()
        }
    };

    if transcription.trim().is_empty() {
        return Ok(Json(ProcessAudioResponse {
            success: true,
            transcription: String::new(),
            follow_up_question: REPEAT_PROMPT.to_string(),
        }));
    }

    let outcome = state
        .service
        .generate_question(&transcription, Some(&language), None, Speaker::Patient)
        .await?;

    Ok(Json(ProcessAudioResponse {
        success: true,
        transcription: outcome.transcription,
        follow_up_question: outcome.follow_up_question,
    }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.service.active_sessions(),
    }))
}
