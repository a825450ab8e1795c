use intake_core::config::EmotionConfig;
use intake_core::taxonomy::tokenize;
use intake_core::{AlertLevel, EmotionResult, PrimaryEmotion, Sentiment, VaderScores};
use tracing::debug;

use crate::keywords::{self, EMOTION_GROUPS};
use crate::lexicon::SentimentScorer;
use crate::recommendations::recommendations_for;

/// Keyword and score evidence for one utterance.
struct Signals {
    words: Vec<String>,
    scores: VaderScores,
    crisis: bool,
    pain_intensity: bool,
    symptom: bool,
}

/// Classifies patient utterances into an [`EmotionResult`].
///
/// Pure and deterministic: the same text always yields the same result.
pub struct EmotionAnalyzer {
    scorer: SentimentScorer,
    config: EmotionConfig,
}

impl Default for EmotionAnalyzer {
    fn default() -> Self {
        Self::new(EmotionConfig::default())
    }
}

impl EmotionAnalyzer {
    pub fn new(config: EmotionConfig) -> Self {
        Self {
            scorer: SentimentScorer::new(),
            config,
        }
    }

    pub fn config(&self) -> &EmotionConfig {
        &self.config
    }

    /// Analyze one utterance.
    pub fn analyze(&self, text: &str) -> EmotionResult {
        if text.trim().is_empty() {
            return self.build(PrimaryEmotion::Neutral, AlertLevel::None, VaderScores::default());
        }

        let words = tokenize(text);
        let signals = Signals {
            scores: self.scorer.polarity_scores(text),
            crisis: keywords::has_crisis_phrase(&words),
            pain_intensity: keywords::has_pain_intensity(&words),
            symptom: keywords::has_symptom(&words),
            words,
        };

        let emotion = self.classify(&signals);
        let alert = self.alert_level(&signals);
        debug!(
            emotion = emotion.as_str(),
            alert = alert.as_str(),
            compound = signals.scores.compound,
            "Utterance analyzed"
        );
        self.build(emotion, alert, signals.scores)
    }

    fn build(&self, emotion: PrimaryEmotion, alert: AlertLevel, scores: VaderScores) -> EmotionResult {
        let sentiment = self.sentiment(scores.compound);
        let sentiment_score = match sentiment {
            Sentiment::Neutral => 0.0,
            _ => scores.compound.abs(),
        };
        EmotionResult {
            primary_emotion: emotion,
            sentiment,
            sentiment_score,
            alert_level: alert,
            vader_scores: scores,
            vader_description: self.describe(scores.compound).to_string(),
            recommendations: recommendations_for(emotion, alert),
        }
    }

    fn classify(&self, s: &Signals) -> PrimaryEmotion {
        let compound = s.scores.compound;
        if s.crisis || (keywords::has_distress_keyword(&s.words) && compound <= self.config.strong_negative) {
            return PrimaryEmotion::Distressed;
        }

        let mut best: Option<(PrimaryEmotion, usize)> = None;
        for group in EMOTION_GROUPS {
            let matched = group.match_count(&s.words);
            if matched == 0 {
                continue;
            }
            let proportion = if group.emotion == PrimaryEmotion::Calm {
                if compound < 0.0 {
                    continue;
                }
                s.scores.pos
            } else {
                s.scores.neg
            };
            let weight = match self.weight_threshold(group.emotion) {
                Some(t) if proportion > t => 2,
                _ => 1,
            };
            let score = matched * weight;
            // Strictly greater keeps the earlier group on ties.
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((group.emotion, score));
            }
        }

        match best {
            Some((emotion, _)) => emotion,
            None if compound <= self.config.strong_negative => PrimaryEmotion::Distressed,
            None if compound >= self.config.strong_positive => PrimaryEmotion::Calm,
            None => PrimaryEmotion::Neutral,
        }
    }

    fn weight_threshold(&self, emotion: PrimaryEmotion) -> Option<f64> {
        let w = &self.config.weights;
        match emotion {
            PrimaryEmotion::Distressed => Some(w.distressed),
            PrimaryEmotion::Anxious => Some(w.anxious),
            PrimaryEmotion::Sad => Some(w.sad),
            PrimaryEmotion::Angry => Some(w.angry),
            PrimaryEmotion::Calm => Some(w.calm),
            PrimaryEmotion::Confused | PrimaryEmotion::Neutral => None,
        }
    }

    fn alert_level(&self, s: &Signals) -> AlertLevel {
        let compound = s.scores.compound;
        if s.crisis {
            AlertLevel::High
        } else if s.pain_intensity && compound <= self.config.strong_negative {
            AlertLevel::High
        } else if (s.symptom || s.pain_intensity) && compound <= self.config.moderate_negative {
            AlertLevel::Medium
        } else if compound <= self.config.mild_negative {
            AlertLevel::Low
        } else {
            AlertLevel::None
        }
    }

    fn sentiment(&self, compound: f64) -> Sentiment {
        if compound >= self.config.positive {
            Sentiment::Positive
        } else if compound <= self.config.negative {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    fn describe(&self, compound: f64) -> &'static str {
        let c = &self.config;
        if compound >= c.strong_positive {
            "Patient appears optimistic/confident"
        } else if compound >= c.positive {
            "Patient seems relatively calm"
        } else if compound <= c.strong_negative {
            "Patient shows significant distress/concern"
        } else if compound <= c.negative {
            "Patient expresses mild concern"
        } else {
            "Patient maintains neutral emotional tone"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendations::STABLE;
    use intake_core::config::EmotionWeights;

    fn analyze(text: &str) -> EmotionResult {
        EmotionAnalyzer::default().analyze(text)
    }

    #[test]
    fn test_blank_text_is_neutral_none() {
        for text in ["", "   ", "\n\t"] {
            let r = analyze(text);
            assert_eq!(r.primary_emotion, PrimaryEmotion::Neutral);
            assert_eq!(r.alert_level, AlertLevel::None);
            assert_eq!(r.sentiment, Sentiment::Neutral);
            assert_eq!(r.vader_scores, VaderScores::default());
            assert_eq!(r.recommendations, vec![STABLE.to_string()]);
        }
    }

    #[test]
    fn test_terrible_pain_is_high_and_distressed() {
        let r = analyze("I am in terrible pain and I feel awful");
        assert!(r.vader_scores.compound < -0.5);
        assert_eq!(r.alert_level, AlertLevel::High);
        assert_eq!(r.primary_emotion, PrimaryEmotion::Distressed);
        assert_eq!(r.sentiment, Sentiment::Negative);
        assert_eq!(r.vader_description, "Patient shows significant distress/concern");
        assert!(r.recommendations.len() >= 2);
    }

    #[test]
    fn test_crisis_phrase_is_high_regardless_of_score() {
        let r = analyze("I can't breathe");
        assert_eq!(r.alert_level, AlertLevel::High);
        assert_eq!(r.primary_emotion, PrimaryEmotion::Distressed);

        let r = analyze("Sometimes I want to end my life");
        assert_eq!(r.alert_level, AlertLevel::High);
    }

    #[test]
    fn test_symptom_with_moderate_negativity_is_medium() {
        let r = analyze("My stomach is upset and I feel a bit worried");
        assert_eq!(r.alert_level, AlertLevel::Medium);
        assert_eq!(r.primary_emotion, PrimaryEmotion::Anxious);
    }

    #[test]
    fn test_mild_negativity_without_symptoms_is_low() {
        let r = analyze("I'm a little annoyed with the wait");
        assert_eq!(r.alert_level, AlertLevel::Low);
        assert_eq!(r.primary_emotion, PrimaryEmotion::Angry);
        assert_eq!(r.vader_description, "Patient expresses mild concern");
    }

    #[test]
    fn test_positive_statement_is_calm_with_no_alert() {
        let r = analyze("I feel good today");
        assert_eq!(r.primary_emotion, PrimaryEmotion::Calm);
        assert_eq!(r.alert_level, AlertLevel::None);
        assert_eq!(r.sentiment, Sentiment::Positive);
        assert_eq!(r.vader_description, "Patient seems relatively calm");
        assert!((r.sentiment_score - r.vader_scores.compound).abs() < f64::EPSILON);
    }

    #[test]
    fn test_negated_positive_is_not_calm() {
        let r = analyze("I don't feel good");
        assert_eq!(r.sentiment, Sentiment::Negative);
        assert_ne!(r.primary_emotion, PrimaryEmotion::Calm);
        assert_eq!(r.alert_level, AlertLevel::Low);
    }

    #[test]
    fn test_confusion_phrase() {
        let r = analyze("I don't understand what the doctor said");
        assert_eq!(r.primary_emotion, PrimaryEmotion::Confused);
        assert!(r.alert_level <= AlertLevel::Low);
    }

    #[test]
    fn test_sadness() {
        let r = analyze("I have been feeling very sad and lonely");
        assert_eq!(r.primary_emotion, PrimaryEmotion::Sad);
        assert_eq!(r.alert_level, AlertLevel::Low);
    }

    #[test]
    fn test_tie_breaks_toward_anxious_over_sad() {
        let r = analyze("I'm worried and sad");
        assert_eq!(r.primary_emotion, PrimaryEmotion::Anxious);
        // "worried" is also a stress symptom keyword.
        assert_eq!(r.alert_level, AlertLevel::Medium);
    }

    #[test]
    fn test_each_matched_keyword_adds_to_group_score() {
        // One anxious keyword against four sad ones.
        let r = analyze("I feel sad, depressed, hopeless and lonely, and worried");
        assert!(r.vader_scores.neg > 0.6);
        assert_eq!(r.primary_emotion, PrimaryEmotion::Sad);
    }

    #[test]
    fn test_unmatched_strong_scores_fall_back_to_bands() {
        assert_eq!(
            analyze("Everything is horrible").primary_emotion,
            PrimaryEmotion::Distressed
        );
        assert_eq!(
            analyze("I am happy and hopeful").primary_emotion,
            PrimaryEmotion::Calm
        );
        let r = analyze("I came in on Tuesday");
        assert_eq!(r.primary_emotion, PrimaryEmotion::Neutral);
        assert_eq!(r.sentiment_score, 0.0);
        assert_eq!(r.vader_description, "Patient maintains neutral emotional tone");
    }

    #[test]
    fn test_deterministic() {
        let a = EmotionAnalyzer::default();
        let text = "My chest hurts and I'm really scared";
        assert_eq!(a.analyze(text), a.analyze(text));
    }

    #[test]
    fn test_thresholds_come_from_config() {
        let strict = EmotionAnalyzer::new(EmotionConfig {
            mild_negative: -0.9,
            ..EmotionConfig::default()
        });
        let r = strict.analyze("I'm a little annoyed with the wait");
        assert_eq!(r.alert_level, AlertLevel::None);
        // The sentiment band is separate from the LOW alert band.
        assert_eq!(r.sentiment, Sentiment::Negative);
        assert_eq!(r.vader_description, "Patient expresses mild concern");
    }

    #[test]
    fn test_negative_sentiment_band_is_independent() {
        let lenient = EmotionAnalyzer::new(EmotionConfig {
            negative: -0.9,
            ..EmotionConfig::default()
        });
        let r = lenient.analyze("I'm a little annoyed with the wait");
        assert_eq!(r.sentiment, Sentiment::Neutral);
        assert_eq!(r.sentiment_score, 0.0);
        assert_eq!(r.alert_level, AlertLevel::Low);
        assert_eq!(r.vader_description, "Patient maintains neutral emotional tone");
    }

    #[test]
    fn test_group_weights_come_from_config() {
        let text = "My stomach is upset and I feel a bit worried";
        assert_eq!(analyze(text).primary_emotion, PrimaryEmotion::Anxious);

        // Anxious can no longer count double; any negativity doubles sad.
        let weights = EmotionWeights {
            anxious: 1.0,
            sad: 0.0,
            ..EmotionWeights::default()
        };
        let tuned = EmotionAnalyzer::new(EmotionConfig {
            weights,
            ..EmotionConfig::default()
        });
        assert_eq!(tuned.analyze(text).primary_emotion, PrimaryEmotion::Sad);
    }
}
