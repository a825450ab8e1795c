//! Keyword groups used for emotion labelling and alert decisions.
//!
//! All entries are lower-case whole words or multi-word phrases, matched
//! against `intake_core::taxonomy::tokenize` output.

use intake_core::taxonomy::{contains_phrase, SYMPTOM_TAXONOMY};
use intake_core::PrimaryEmotion;

/// Explicit crisis or self-harm phrases. Any match raises a HIGH alert.
pub static CRISIS_PHRASES: &[&str] = &[
    "kill myself",
    "killing myself",
    "suicide",
    "suicidal",
    "end my life",
    "end it all",
    "want to die",
    "wanna die",
    "hurt myself",
    "harm myself",
    "self harm",
    "no reason to live",
    "overdose",
    "can't breathe",
    "cannot breathe",
    "chest pain",
];

/// Words signalling severe pain.
pub static PAIN_INTENSITY: &[&str] = &[
    "severe",
    "excruciating",
    "unbearable",
    "worst",
    "agony",
    "agonizing",
    "intense",
    "extreme",
    "terrible pain",
    "killing me",
    "sharp",
];

/// One emotion keyword group.
#[derive(Debug)]
pub struct EmotionGroup {
    pub emotion: PrimaryEmotion,
    pub keywords: &'static [&'static str],
}

/// Emotion groups in tie-break order.
pub static EMOTION_GROUPS: &[EmotionGroup] = &[
    EmotionGroup {
        emotion: PrimaryEmotion::Distressed,
        keywords: &[
            "need help", "scared", "panic", "emergency", "urgent", "dizzy", "faint", "terrible",
            "awful", "getting worse", "unbearable", "can't take it", "desperate", "severe",
            "excruciating", "overwhelming",
        ],
    },
    EmotionGroup {
        emotion: PrimaryEmotion::Anxious,
        keywords: &[
            "nervous", "worried", "worry", "anxious", "anxiety", "stressed", "tense", "uneasy",
            "concerned", "restless", "jittery", "on edge", "overwhelmed", "panicked", "afraid",
            "frightened", "terrified", "fearful", "fear", "what if",
        ],
    },
    EmotionGroup {
        emotion: PrimaryEmotion::Sad,
        keywords: &[
            "sad", "depressed", "hopeless", "crying", "tears", "upset", "miserable", "lonely",
            "empty", "devastated", "heartbroken",
        ],
    },
    EmotionGroup {
        emotion: PrimaryEmotion::Angry,
        keywords: &[
            "angry", "mad", "furious", "rage", "hate", "disgusting", "stupid", "ridiculous",
            "outrageous", "unacceptable", "infuriating", "frustrated", "frustrating", "annoying",
            "annoyed", "irritated", "irritating", "fed up", "sick of", "nothing works",
            "tried everything", "give up",
        ],
    },
    EmotionGroup {
        emotion: PrimaryEmotion::Confused,
        keywords: &[
            "confused", "confusing", "don't understand", "not sure", "unclear",
            "what do you mean", "don't know", "not clear", "don't get it", "can you repeat",
            "i'm lost",
        ],
    },
    EmotionGroup {
        emotion: PrimaryEmotion::Calm,
        keywords: &[
            "fine", "okay", "good", "better", "calm", "relaxed", "peaceful", "comfortable",
            "stable", "manageable", "relieved",
        ],
    },
];

fn any_phrase(words: &[String], phrases: &[&str]) -> bool {
    phrases.iter().any(|p| contains_phrase(words, p))
}

pub fn has_crisis_phrase(words: &[String]) -> bool {
    any_phrase(words, CRISIS_PHRASES)
}

pub fn has_pain_intensity(words: &[String]) -> bool {
    any_phrase(words, PAIN_INTENSITY)
}

/// Any keyword of the shared symptom taxonomy.
pub fn has_symptom(words: &[String]) -> bool {
    SYMPTOM_TAXONOMY.iter().any(|c| c.matches(words))
}

pub fn has_distress_keyword(words: &[String]) -> bool {
    EMOTION_GROUPS
        .iter()
        .find(|g| g.emotion == PrimaryEmotion::Distressed)
        .is_some_and(|g| any_phrase(words, g.keywords))
}

impl EmotionGroup {
    /// Number of distinct keywords of this group present in the text.
    pub fn match_count(&self, words: &[String]) -> usize {
        self.keywords
            .iter()
            .filter(|k| contains_phrase(words, k))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::taxonomy::tokenize;

    #[test]
    fn test_crisis_phrase_detection() {
        assert!(has_crisis_phrase(&tokenize("Sometimes I want to end my life")));
        assert!(has_crisis_phrase(&tokenize("I CAN'T BREATHE")));
        assert!(!has_crisis_phrase(&tokenize("I want to get better")));
    }

    #[test]
    fn test_pain_intensity_phrase() {
        assert!(has_pain_intensity(&tokenize("It's a terrible pain")));
        assert!(has_pain_intensity(&tokenize("a sharp stabbing feeling")));
        assert!(!has_pain_intensity(&tokenize("a mild pain")));
    }

    #[test]
    fn test_symptom_uses_shared_taxonomy() {
        assert!(has_symptom(&tokenize("I've had a cough since Monday")));
        assert!(!has_symptom(&tokenize("I'm here for my annual visit")));
    }

    #[test]
    fn test_match_count_counts_each_keyword() {
        let sad = EMOTION_GROUPS
            .iter()
            .find(|g| g.emotion == PrimaryEmotion::Sad)
            .unwrap();
        let words = tokenize("sad, depressed and lonely, so sad");
        assert_eq!(sad.match_count(&words), 3);
        assert_eq!(sad.match_count(&tokenize("all good here")), 0);
    }

    #[test]
    fn test_groups_are_in_tie_break_order() {
        let order: Vec<PrimaryEmotion> = EMOTION_GROUPS.iter().map(|g| g.emotion).collect();
        assert_eq!(
            order,
            vec![
                PrimaryEmotion::Distressed,
                PrimaryEmotion::Anxious,
                PrimaryEmotion::Sad,
                PrimaryEmotion::Angry,
                PrimaryEmotion::Confused,
                PrimaryEmotion::Calm,
            ]
        );
    }
}
