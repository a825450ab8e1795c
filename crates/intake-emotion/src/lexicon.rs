//! Valence-aware sentiment scoring.
//!
//! Thin adapter over the VADER analyzer from `vader_sentiment`, which carries
//! the full VADER lexicon and its rules for boosters, negation, capitalisation,
//! contrastive "but" and punctuation. Scores come back as [`VaderScores`].

use intake_core::VaderScores;
use vader_sentiment::SentimentIntensityAnalyzer;

/// Lexicon-based sentiment scorer. Build once and reuse.
pub struct SentimentScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    /// Score a piece of text.
    ///
    /// Blank text returns all-zero scores.
    pub fn polarity_scores(&self, text: &str) -> VaderScores {
        if text.trim().is_empty() {
            return VaderScores::default();
        }
        let scores = self.analyzer.polarity_scores(text);
        let get = |key: &str| scores.get(key).copied().unwrap_or(0.0);
        VaderScores {
            compound: get("compound"),
            pos: get("pos"),
            neg: get("neg"),
            neu: get("neu"),
        }
    }
}
