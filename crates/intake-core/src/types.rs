//! Domain types shared across the intake engine.
//!
//! Sessions own an append-only sequence of turns. Patient turns carry the
//! emotion result computed when they were appended.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Speaker
// =============================================================================

/// Who produced an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Patient,
    Doctor,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Doctor => "doctor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "patient" => Some(Self::Patient),
            "doctor" => Some(Self::Doctor),
            _ => None,
        }
    }

    /// Label used when rendering transcripts for prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Patient => "Patient",
            Self::Doctor => "Doctor",
        }
    }
}

impl Default for Speaker {
    fn default() -> Self {
        Self::Patient
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Emotion
// =============================================================================

/// Closed set of primary emotion labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryEmotion {
    Neutral,
    Calm,
    Confused,
    Anxious,
    Distressed,
    Sad,
    Angry,
}

impl PrimaryEmotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Calm => "calm",
            Self::Confused => "confused",
            Self::Anxious => "anxious",
            Self::Distressed => "distressed",
            Self::Sad => "sad",
            Self::Angry => "angry",
        }
    }

    /// Neutral and calm are the "settled" states that never raise concerns.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Neutral | Self::Calm)
    }
}

impl fmt::Display for PrimaryEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse sentiment derived from the compound score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

/// Discrete alert severity. Ordered from `None` to `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    None,
    Low,
    Medium,
    High,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    pub fn is_alert(&self) -> bool {
        *self != Self::None
    }
}

impl Default for AlertLevel {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Valence scores. `compound` is in [-1, 1]; the proportions are in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VaderScores {
    pub compound: f64,
    pub pos: f64,
    pub neg: f64,
    pub neu: f64,
}

/// Emotion analysis of one patient utterance. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionResult {
    pub primary_emotion: PrimaryEmotion,
    pub sentiment: Sentiment,
    /// Magnitude of the compound score, 0.0 inside the neutral band.
    pub sentiment_score: f64,
    pub alert_level: AlertLevel,
    pub vader_scores: VaderScores,
    pub vader_description: String,
    pub recommendations: Vec<String>,
}

// =============================================================================
// Session and turns
// =============================================================================

/// One utterance within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Zero-based position in the session.
    pub sequence: u64,
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "emotion_analysis")]
    pub emotion: Option<EmotionResult>,
}

/// A bounded conversation between patient and clinician.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "session_id")]
    pub id: Uuid,
    pub language: String,
    pub patient_info: serde_json::Value,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    #[serde(rename = "conversation_history")]
    pub turns: Vec<Turn>,
}

impl Session {
    /// Create an empty session.
    pub fn new(language: impl Into<String>, patient_info: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            language: language.into(),
            patient_info,
            started_at: now,
            last_activity_at: now,
            turns: Vec::new(),
        }
    }

    /// Derived timeline of every emotion-scored turn.
    pub fn emotion_timeline(&self) -> Vec<EmotionTimelineEntry> {
        emotion_timeline(&self.turns)
    }
}

/// One point on a session's emotion timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionTimelineEntry {
    pub timestamp: DateTime<Utc>,
    pub emotion: PrimaryEmotion,
    pub alert_level: AlertLevel,
    pub sentiment_score: f64,
    pub text: String,
}

/// Build the emotion timeline for a slice of turns.
pub fn emotion_timeline(turns: &[Turn]) -> Vec<EmotionTimelineEntry> {
    turns
        .iter()
        .filter_map(|t| {
            t.emotion.as_ref().map(|e| EmotionTimelineEntry {
                timestamp: t.timestamp,
                emotion: e.primary_emotion,
                alert_level: e.alert_level,
                sentiment_score: e.sentiment_score,
                text: t.text.clone(),
            })
        })
        .collect()
}

// =============================================================================
// Summary
// =============================================================================

/// Where the free-text summary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    Generated,
    Fallback,
}

/// Structured insights extracted from patient statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub symptoms: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendations: Vec<String>,
    pub emotional_patterns: Vec<String>,
}

/// Turn statistics for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationStats {
    pub total_exchanges: usize,
    pub patient_statements: usize,
    pub doctor_questions: usize,
    pub emotion_alerts: usize,
    pub started_at: DateTime<Utc>,
}

/// Aggregate report derived on demand from a session's turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub session_id: Uuid,
    pub summary: String,
    pub summary_source: SummarySource,
    pub insights: Insights,
    pub conversation_stats: ConversationStats,
}
