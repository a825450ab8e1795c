//! Conversation orchestration.
//!
//! `ConversationService` ties one utterance to its session: it scores the
//! patient's emotion, appends the turn, and asks the question and summary
//! generators for the next prompt.

use std::sync::Arc;

use chrono::Duration;
use intake_core::config::{IntakeConfig, SessionConfig, SummaryConfig};
use intake_core::{
    EmotionResult, EmotionTimelineEntry, Result, Session, Speaker, SummaryReport,
};
use intake_emotion::EmotionAnalyzer;
use intake_llm::{ResilientGenerator, RetryPolicy, TextGenerator};
use intake_session::SessionStore;
use tracing::{debug, info};
use uuid::Uuid;

use crate::question::{QuestionGenerator, REPEAT_PROMPT};
use crate::summary::SummaryGenerator;

/// Result of handling one utterance.
#[derive(Debug, Clone)]
pub struct QuestionOutcome {
    pub transcription: String,
    pub follow_up_question: String,
    pub session_id: Option<Uuid>,
    /// Turns up to and including this one; 0 without a session.
    pub conversation_length: usize,
    /// Present for patient utterances.
    pub emotion_analysis: Option<EmotionResult>,
    pub conversation_summary: Option<String>,
}

/// Session snapshot with derived views.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub session: Session,
    pub emotion_timeline: Vec<EmotionTimelineEntry>,
    pub summary: Option<String>,
}

/// Composes the session store, emotion analyzer, and generators.
pub struct ConversationService {
    store: SessionStore,
    analyzer: EmotionAnalyzer,
    questions: QuestionGenerator,
    summaries: SummaryGenerator,
    session_config: SessionConfig,
    summary_config: SummaryConfig,
}

impl ConversationService {
    /// Build the service. `generator` is wrapped with the timeout and retry
    /// policy from `config.llm`.
    pub fn new(config: &IntakeConfig, generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_retry_policy(config, generator, RetryPolicy::from_config(&config.llm))
    }

    pub fn with_retry_policy(
        config: &IntakeConfig,
        generator: Arc<dyn TextGenerator>,
        policy: RetryPolicy,
    ) -> Self {
        let resilient: Arc<dyn TextGenerator> = Arc::new(ResilientGenerator::new(generator, policy));
        Self {
            store: SessionStore::from_config(&config.session),
            analyzer: EmotionAnalyzer::new(config.emotion.clone()),
            questions: QuestionGenerator::new(Arc::clone(&resilient), config.question.clone()),
            summaries: SummaryGenerator::new(resilient, config.summary.clone()),
            session_config: config.session.clone(),
            summary_config: config.summary.clone(),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn analyzer(&self) -> &EmotionAnalyzer {
        &self.analyzer
    }

    pub fn active_sessions(&self) -> usize {
        self.store.len()
    }

    /// Open a new session.
    pub fn start_session(
        &self,
        language: Option<&str>,
        patient_info: Option<serde_json::Value>,
    ) -> Result<Uuid> {
        let language = language
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.session_config.default_language);
        let patient_info = patient_info.unwrap_or_else(|| serde_json::json!({}));
        Ok(self.store.create_session(language, patient_info)?)
    }

    /// Handle one transcribed utterance and produce the next question.
    ///
    /// Blank text appends nothing and returns the repeat prompt. Without a
    /// session id the question is generated statelessly.
    pub async fn generate_question(
        &self,
        text: &str,
        language: Option<&str>,
        session_id: Option<Uuid>,
        speaker: Speaker,
    ) -> Result<QuestionOutcome> {
        let text = text.trim();
        if text.is_empty() {
            let conversation_length = session_id
                .and_then(|id| self.store.get_history(id).ok())
                .map_or(0, |h| h.len());
            return Ok(QuestionOutcome {
                transcription: String::new(),
                follow_up_question: REPEAT_PROMPT.to_string(),
                session_id,
                conversation_length,
                emotion_analysis: None,
                conversation_summary: None,
            });
        }

        let emotion = (speaker == Speaker::Patient).then(|| self.analyzer.analyze(text));

        let (history, session_language) = match session_id {
            Some(id) => {
                let appended = self
                    .store
                    .append_with_history(id, speaker, text, emotion.clone())?;
                let mut history = appended.prior;
                history.push(appended.turn);
                (history, Some(appended.language))
            }
            None => (Vec::new(), None),
        };
        let language = language
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .or(session_language)
            .unwrap_or_else(|| self.session_config.default_language.clone());

        // Ends with this utterance; turns appended after it are not visible.
        let prior = &history[..history.len().saturating_sub(1)];
        let follow_up_question = self
            .questions
            .next_question(text, prior, emotion.as_ref(), &language)
            .await;

        let conversation_summary = if session_id.is_some()
            && history.len() >= self.summary_config.brief_summary_min_turns
        {
            self.summaries.brief_summary(&history, &language).await
        } else {
            None
        };

        debug!(
            session_id = ?session_id,
            speaker = speaker.as_str(),
            conversation_length = history.len(),
            "Utterance handled"
        );
        Ok(QuestionOutcome {
            transcription: text.to_string(),
            follow_up_question,
            session_id,
            conversation_length: history.len(),
            emotion_analysis: emotion,
            conversation_summary,
        })
    }

    /// Comprehensive summary report for a session.
    pub async fn summarize(&self, session_id: Uuid) -> Result<SummaryReport> {
        let session = self.store.get_session(session_id)?;
        self.summaries.summarize(&session).await
    }

    /// Session snapshot with its emotion timeline and, once the patient has
    /// spoken, a brief summary.
    pub async fn session_view(&self, session_id: Uuid) -> Result<SessionView> {
        let session = self.store.get_session(session_id)?;
        let summary = self
            .summaries
            .brief_summary(&session.turns, &session.language)
            .await;
        Ok(SessionView {
            emotion_timeline: session.emotion_timeline(),
            session,
            summary,
        })
    }

    pub fn end_session(&self, session_id: Uuid) -> Result<()> {
        Ok(self.store.delete_session(session_id)?)
    }

    /// Drop sessions idle longer than the configured TTL.
    pub fn purge_expired(&self) -> Result<usize> {
        let ttl = Duration::minutes(i64::from(self.session_config.ttl_minutes));
        let removed = self.store.purge_expired(ttl)?;
        if removed > 0 {
            info!(removed, "Idle sessions expired");
        }
        Ok(removed)
    }
}
