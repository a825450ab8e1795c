//! Conversation summaries.
//!
//! Statistics and structured insights are computed locally from the turns.
//! Only the free-text summary is delegated to the generative collaborator,
//! with a fixed template when that call fails.

use std::fmt::Write as _;
use std::sync::Arc;

use intake_core::config::SummaryConfig;
use intake_core::taxonomy;
use intake_core::{
    emotion_timeline, AlertLevel, ConversationStats, Insights, IntakeError, PrimaryEmotion,
    Result, Session, Speaker, SummaryReport, SummarySource, Turn,
};
use intake_llm::{GenerationRequest, TextGenerator};
use tracing::{info, warn};

/// Emotions listed in `emotional_patterns`.
const TOP_EMOTIONS: usize = 3;
/// Timeline entries included in a prompt digest.
const DIGEST_EMOTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SummaryKind {
    Comprehensive,
    Brief,
}

/// Turn statistics for a session.
pub fn conversation_stats(session: &Session) -> ConversationStats {
    let count = |speaker: Speaker| session.turns.iter().filter(|t| t.speaker == speaker).count();
    ConversationStats {
        total_exchanges: session.turns.len(),
        patient_statements: count(Speaker::Patient),
        doctor_questions: count(Speaker::Doctor),
        emotion_alerts: session
            .turns
            .iter()
            .filter(|t| t.emotion.as_ref().is_some_and(|e| e.alert_level.is_alert()))
            .count(),
        started_at: session.started_at,
    }
}

/// Highest alert level carried by any turn.
pub fn highest_alert(turns: &[Turn]) -> AlertLevel {
    turns
        .iter()
        .filter_map(|t| t.emotion.as_ref().map(|e| e.alert_level))
        .max()
        .unwrap_or_default()
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

/// Structured insights from patient statements.
///
/// Each list is deduplicated by exact text and keeps first-seen order.
pub fn extract_insights(turns: &[Turn]) -> Insights {
    let mut insights = Insights::default();
    let mut emotion_counts: Vec<(PrimaryEmotion, usize)> = Vec::new();

    for turn in turns.iter().filter(|t| t.speaker == Speaker::Patient) {
        for category in taxonomy::all_matches(&turn.text) {
            push_unique(&mut insights.symptoms, category.symptom);
            push_unique(&mut insights.concerns, category.concern);
            push_unique(&mut insights.recommendations, category.recommendation);
        }

        let Some(emotion) = &turn.emotion else {
            continue;
        };
        match emotion_counts.iter_mut().find(|(e, _)| *e == emotion.primary_emotion) {
            Some((_, n)) => *n += 1,
            None => emotion_counts.push((emotion.primary_emotion, 1)),
        }
        if !emotion.primary_emotion.is_settled() && emotion.alert_level >= AlertLevel::Low {
            push_unique(
                &mut insights.concerns,
                &format!("Patient appeared {}", emotion.primary_emotion),
            );
        }
        if emotion.alert_level >= AlertLevel::Medium {
            for rec in &emotion.recommendations {
                push_unique(&mut insights.recommendations, rec);
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    emotion_counts.sort_by(|a, b| b.1.cmp(&a.1));
    insights.emotional_patterns = emotion_counts
        .into_iter()
        .take(TOP_EMOTIONS)
        .map(|(e, n)| format!("{e}: {n} times"))
        .collect();
    insights
}

/// Template used when the collaborator cannot summarize. `None` without a
/// patient statement.
pub fn fallback_summary(turns: &[Turn]) -> Option<String> {
    let first = turns.iter().find(|t| t.speaker == Speaker::Patient)?;
    Some(format!(
        "Patient reported: \"{}\". {} exchanges recorded. Highest emotional alert level: {}.",
        first.text,
        turns.len(),
        highest_alert(turns)
    ))
}

/// Builds summary reports for sessions.
pub struct SummaryGenerator {
    generator: Arc<dyn TextGenerator>,
    config: SummaryConfig,
}

impl SummaryGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, config: SummaryConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    /// Comprehensive report for a whole session.
    ///
    /// Fails with `EmptySession` when the session has no patient statements.
    pub async fn summarize(&self, session: &Session) -> Result<SummaryReport> {
        if !session.turns.iter().any(|t| t.speaker == Speaker::Patient) {
            return Err(IntakeError::EmptySession(session.id));
        }

        let (summary, summary_source) = self
            .summary_text(&session.turns, SummaryKind::Comprehensive, &session.language)
            .await;
        let report = SummaryReport {
            session_id: session.id,
            summary,
            summary_source,
            insights: extract_insights(&session.turns),
            conversation_stats: conversation_stats(session),
        };
        info!(
            session_id = %session.id,
            source = ?report.summary_source,
            exchanges = report.conversation_stats.total_exchanges,
            "Summary generated"
        );
        Ok(report)
    }

    /// Short summary of the most recent turns, or `None` if they contain no
    /// patient statement.
    pub async fn brief_summary(&self, turns: &[Turn], language: &str) -> Option<String> {
        let window = &turns[turns.len().saturating_sub(self.config.brief_history_window)..];
        if !window.iter().any(|t| t.speaker == Speaker::Patient) {
            return None;
        }
        let (text, _) = self.summary_text(window, SummaryKind::Brief, language).await;
        Some(text)
    }

    async fn summary_text(
        &self,
        turns: &[Turn],
        kind: SummaryKind,
        language: &str,
    ) -> (String, SummarySource) {
        let max_tokens = match kind {
            SummaryKind::Comprehensive => self.config.max_output_tokens,
            SummaryKind::Brief => self.config.brief_max_output_tokens,
        };
        let request = GenerationRequest::new(build_prompt(turns, kind, language))
            .with_max_output_tokens(max_tokens)
            .with_temperature(self.config.temperature)
            .with_top_p(0.9);

        match self.generator.generate(&request).await {
            Ok(text) => (text, SummarySource::Generated),
            Err(e) => {
                warn!(
                    generator = self.generator.name(),
                    error = %e,
                    "Summary generation failed, using fallback"
                );
                let text = fallback_summary(turns).unwrap_or_default();
                (text, SummarySource::Fallback)
            }
        }
    }
}

fn build_prompt(turns: &[Turn], kind: SummaryKind, language: &str) -> String {
    let mut transcript = String::new();
    for turn in turns {
        let _ = writeln!(transcript, "{}: {}", turn.speaker.label(), turn.text);
    }

    let timeline = emotion_timeline(turns);
    let mut digest = String::new();
    if !timeline.is_empty() {
        let recent: Vec<&str> = timeline
            .iter()
            .skip(timeline.len().saturating_sub(DIGEST_EMOTIONS))
            .map(|e| e.emotion.as_str())
            .collect();
        let _ = write!(digest, "\nEmotion timeline: {}", recent.join(", "));
        let alerts = timeline.iter().filter(|e| e.alert_level.is_alert()).count();
        if alerts > 0 {
            let _ = write!(digest, "\nAlert count: {alerts} emotional alerts detected");
        }
    }

    let mut prompt = match kind {
        SummaryKind::Comprehensive => format!(
            "You are a medical assistant. Provide a comprehensive summary of this doctor-patient conversation.\n\n\
             Conversation:\n{transcript}{digest}\n\n\
             Please include:\n\
             1. Chief complaints and symptoms\n\
             2. Patient's emotional state\n\
             3. Key medical information mentioned\n\
             4. Suggested next steps\n\
             5. Recommendations for the doctor\n\n\
             Write a clear, professional medical summary."
        ),
        SummaryKind::Brief => format!(
            "Summarize this doctor-patient conversation briefly.\n\n{transcript}{digest}\n\n\
             Provide the key points and symptoms mentioned."
        ),
    };
    if !language.to_ascii_lowercase().starts_with("en") {
        let _ = write!(prompt, "\nWrite the summary in the language with tag {language}.");
    }
    prompt
}
