//! Emotion analysis for patient utterances.
//!
//! Provides:
//! - VADER sentiment scoring producing compound/pos/neg/neu scores
//! - Keyword-driven primary emotion labelling
//! - The alert-level decision table
//! - Fixed clinician-facing recommendations keyed by (emotion, alert)

pub mod analyzer;
pub mod keywords;
pub mod lexicon;
pub mod recommendations;

pub use analyzer::EmotionAnalyzer;
pub use lexicon::SentimentScorer;
pub use recommendations::recommendations_for;
