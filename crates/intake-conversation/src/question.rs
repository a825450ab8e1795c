//! Follow-up question generation.
//!
//! The primary path prompts the generative collaborator with recent history,
//! detected medical pattern categories, and the emotional context of the new
//! utterance. Any collaborator failure falls back to the deterministic bank
//! in `intake_core::taxonomy`.

use std::fmt::Write as _;
use std::sync::Arc;

use intake_core::config::QuestionConfig;
use intake_core::taxonomy::{self, contains_phrase, tokenize, BankLanguage};
use intake_core::{EmotionResult, Speaker, Turn};
use intake_llm::{GenerationRequest, TextGenerator};
use tracing::{debug, warn};

/// Returned for blank input instead of a question.
pub const REPEAT_PROMPT: &str = "I couldn't hear you clearly. Could you please repeat what you said?";

const MAX_QUESTIONS: usize = 3;

/// Broad medical themes surfaced to the prompt.
static MEDICAL_PATTERNS: &[(&str, &[&str])] = &[
    (
        "pain_symptoms",
        &["pain", "hurt", "hurts", "ache", "sore", "burning", "stabbing", "throbbing", "sharp", "dull"],
    ),
    (
        "respiratory",
        &["cough", "breathing", "breath", "chest", "wheeze", "shortness", "difficulty breathing"],
    ),
    (
        "gastrointestinal",
        &["stomach", "nausea", "vomit", "diarrhea", "constipation", "bloating", "appetite"],
    ),
    (
        "neurological",
        &["headache", "dizzy", "dizziness", "confusion", "memory", "concentration", "weakness"],
    ),
    (
        "cardiovascular",
        &["heart", "palpitations", "chest pain", "pressure", "racing heart", "irregular"],
    ),
    (
        "systemic",
        &["fever", "tired", "fatigue", "weakness", "energy", "sleep", "weight"],
    ),
    (
        "mental_health",
        &["stress", "anxiety", "depression", "worried", "panic", "mood", "emotional"],
    ),
    (
        "timeline",
        &["days", "weeks", "months", "since", "started", "began", "first time", "getting worse", "better"],
    ),
];

/// Medical pattern categories mentioned across the given patient statements.
pub fn medical_patterns<'a>(statements: impl IntoIterator<Item = &'a str>) -> Vec<&'static str> {
    let words: Vec<String> = statements.into_iter().flat_map(tokenize).collect();
    MEDICAL_PATTERNS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| contains_phrase(&words, k)))
        .map(|(name, _)| *name)
        .collect()
}

/// Deterministic follow-up questions for `text`.
///
/// The first matching symptom group supplies its questions; remaining slots
/// are filled from the general set. Hindi language tags get the Hindi bank,
/// every other tag the English one. More than one question is rendered as a
/// numbered list.
pub fn fallback_questions(text: &str, count: usize, language: &str) -> String {
    let count = count.clamp(1, MAX_QUESTIONS);
    let bank = BankLanguage::from_tag(language);
    let mut selected: Vec<&str> = taxonomy::first_match(text)
        .map(|c| c.questions_for(bank).iter().copied().take(count).collect())
        .unwrap_or_default();
    for &q in taxonomy::general_questions(bank) {
        if selected.len() >= count {
            break;
        }
        if !selected.contains(&q) {
            selected.push(q);
        }
    }
    format_questions(&selected)
}

fn format_questions(questions: &[&str]) -> String {
    match questions {
        [single] => (*single).to_string(),
        many => many
            .iter()
            .enumerate()
            .map(|(i, q)| format!("{}. {}", i + 1, q))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Produces the next clinician question for a patient utterance.
pub struct QuestionGenerator {
    generator: Arc<dyn TextGenerator>,
    config: QuestionConfig,
}

impl QuestionGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, config: QuestionConfig) -> Self {
        Self { generator, config }
    }

    fn count(&self) -> usize {
        self.config.question_count.clamp(1, MAX_QUESTIONS)
    }

    /// Generate follow-up question(s). Never fails: collaborator errors fall
    /// back to the deterministic bank.
    ///
    /// `history` holds the turns preceding `text`.
    pub async fn next_question(
        &self,
        text: &str,
        history: &[Turn],
        emotion: Option<&EmotionResult>,
        language: &str,
    ) -> String {
        let count = self.count();
        let request = GenerationRequest::new(self.build_prompt(text, history, emotion, language))
            .with_max_output_tokens(self.config.max_output_tokens)
            .with_temperature(self.config.temperature)
            .with_top_p(0.95)
            .with_stop_sequences(["Patient:".to_string(), "Doctor:".to_string(), format!("{}.", count + 1)]);

        match self.generator.generate(&request).await {
            Ok(question) => {
                debug!(generator = self.generator.name(), "Follow-up question generated");
                question
            }
            Err(e) => {
                warn!(
                    generator = self.generator.name(),
                    error = %e,
                    "Question generation failed, using fallback"
                );
                fallback_questions(text, count, language)
            }
        }
    }

    /// Prompt sent to the generative collaborator.
    pub fn build_prompt(
        &self,
        text: &str,
        history: &[Turn],
        emotion: Option<&EmotionResult>,
        language: &str,
    ) -> String {
        let count = self.count();
        let mut prompt = String::from(
            "You are an assistant supporting a doctor during a medical consultation. \
             Read the transcribed speech and suggest relevant follow-up questions for the doctor.\n",
        );
        let _ = writeln!(
            prompt,
            "Generate {count} distinct, short, clinically appropriate follow-up question(s). \
             Each should explore a different aspect of the patient's condition \
             (symptoms, timeline, severity, triggers)."
        );

        let window = self.config.history_window;
        let recent = &history[history.len().saturating_sub(window)..];
        if !recent.is_empty() {
            prompt.push_str("\nCONVERSATION HISTORY:\n");
            for turn in recent {
                let _ = writeln!(prompt, "{}: {}", turn.speaker.label(), turn.text);
            }
        }

        let patterns = medical_patterns(
            recent
                .iter()
                .filter(|t| t.speaker == Speaker::Patient)
                .map(|t| t.text.as_str())
                .chain(std::iter::once(text)),
        );
        if !patterns.is_empty() {
            let _ = writeln!(
                prompt,
                "\nMEDICAL PATTERN ANALYSIS: the patient has mentioned symptoms in these categories: {}. \
                 Focus questions on exploring these patterns.",
                patterns.join(", ")
            );
        }

        let _ = writeln!(prompt, "\nPatient: \"{text}\"");

        if let Some(e) = emotion {
            let recs: Vec<&str> = e.recommendations.iter().take(2).map(String::as_str).collect();
            let _ = writeln!(
                prompt,
                "\nEMOTIONAL CONTEXT:\n- Emotional state: {}\n- Alert level: {}\n- Tone: {}\n- Recommendations: {}\n\
                 Consider this emotional context when phrasing the questions.",
                e.primary_emotion,
                e.alert_level,
                e.vader_description,
                recs.join("; ")
            );
        }

        if !language.to_ascii_lowercase().starts_with("en") {
            let _ = writeln!(prompt, "\nWrite the questions in the language with tag {language}.");
        }

        if count > 1 {
            let _ = write!(prompt, "\nFormat: one question per line, numbered 1. to {count}.");
        } else {
            prompt.push_str("\nFormat: a single question on one line.");
        }
        prompt
    }
}
