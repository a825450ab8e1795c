//! Symptom keyword taxonomy.
//!
//! A single ordered table of keyword groups, shared by follow-up question
//! routing and insight extraction. Table order is match priority: the first
//! group whose keywords appear in an utterance wins. Keywords mix English and
//! Hindi terms; questions come in both languages.

/// Languages with a built-in question bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankLanguage {
    English,
    Hindi,
}

impl BankLanguage {
    /// `hi` and any `hi-*` tag select Hindi; every other tag English.
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag.trim().split(['-', '_']).next().unwrap_or("");
        if primary.eq_ignore_ascii_case("hi") {
            Self::Hindi
        } else {
            Self::English
        }
    }
}

/// One symptom group of the taxonomy.
#[derive(Debug)]
pub struct SymptomCategory {
    /// Stable identifier, e.g. `"pain"`.
    pub name: &'static str,
    /// Whole words or multi-word phrases, lower-case.
    pub keywords: &'static [&'static str],
    /// Ordered follow-up questions (1 to 3).
    pub questions: &'static [&'static str],
    /// The same questions in Hindi.
    pub questions_hi: &'static [&'static str],
    /// Symptom label added to summary insights.
    pub symptom: &'static str,
    /// Patient concern added to summary insights.
    pub concern: &'static str,
    /// Clinician-facing recommendation added to summary insights.
    pub recommendation: &'static str,
}

impl SymptomCategory {
    /// Whether any keyword of this group occurs in the tokenized text.
    pub fn matches(&self, words: &[String]) -> bool {
        self.keywords.iter().any(|k| contains_phrase(words, k))
    }

    pub fn questions_for(&self, language: BankLanguage) -> &'static [&'static str] {
        match language {
            BankLanguage::English => self.questions,
            BankLanguage::Hindi => self.questions_hi,
        }
    }
}

/// Symptom groups in priority order.
pub static SYMPTOM_TAXONOMY: &[SymptomCategory] = &[
    SymptomCategory {
        name: "pain",
        keywords: &[
            "pain", "pains", "painful", "hurt", "hurts", "hurting", "ache", "aches", "aching",
            "sore", "burning", "stabbing", "throbbing", "cramp", "cramps", "दर्द",
        ],
        questions: &[
            "How would you rate your pain or discomfort on a scale of 1 to 10?",
            "Where exactly do you feel the pain, and does it spread anywhere?",
            "Is the pain constant, or does it come and go?",
        ],
        questions_hi: &[
            "आप अपने दर्द या परेशानी को 1 से 10 के पैमाने पर कैसे रेट करेंगे?",
            "आपको दर्द ठीक कहाँ महसूस होता है, और क्या यह कहीं और फैलता है?",
            "क्या दर्द लगातार रहता है, या आता-जाता रहता है?",
        ],
        symptom: "Pain or discomfort",
        concern: "Ongoing pain affecting comfort",
        recommendation: "Assess pain location, severity, and duration",
    },
    SymptomCategory {
        name: "fever",
        keywords: &[
            "fever", "fevers", "feverish", "temperature", "chills", "shivering", "बुखार",
        ],
        questions: &[
            "When did you first notice the fever?",
            "Have you measured your temperature, and how high has it been?",
            "Are you experiencing chills, sweating, or body aches along with the fever?",
        ],
        questions_hi: &[
            "आपको बुखार पहली बार कब महसूस हुआ?",
            "क्या आपने अपना तापमान मापा है, और यह कितना रहा है?",
            "क्या बुखार के साथ आपको ठंड लगना, पसीना आना या बदन दर्द हो रहा है?",
        ],
        symptom: "Fever",
        concern: "Possible infection indicated by fever",
        recommendation: "Record temperature history and check for signs of infection",
    },
    SymptomCategory {
        name: "cough",
        keywords: &[
            "cough", "coughs", "coughing", "wheeze", "wheezing", "phlegm", "mucus", "congestion",
            "short of breath", "shortness of breath", "खांसी",
        ],
        questions: &[
            "How long have you had the cough?",
            "Is the cough dry, or are you bringing up mucus?",
            "Do you feel short of breath or have any chest tightness?",
        ],
        questions_hi: &[
            "आपको खांसी कितने समय से है?",
            "क्या खांसी सूखी है, या बलगम भी आता है?",
            "क्या आपको सांस लेने में तकलीफ या सीने में जकड़न महसूस होती है?",
        ],
        symptom: "Cough or respiratory symptoms",
        concern: "Respiratory discomfort",
        recommendation: "Assess breathing, cough duration, and sputum",
    },
    SymptomCategory {
        name: "headache",
        keywords: &["headache", "headaches", "migraine", "migraines", "सिरदर्द"],
        questions: &[
            "Where is the headache located, and how would you describe it?",
            "How often do the headaches occur and how long do they last?",
            "Have you noticed any changes in vision, nausea, or sensitivity to light?",
        ],
        questions_hi: &[
            "सिरदर्द कहाँ होता है, और आप इसका वर्णन कैसे करेंगे?",
            "सिरदर्द कितनी बार होता है और कितनी देर तक रहता है?",
            "क्या आपने देखने में बदलाव, मतली या रोशनी से परेशानी महसूस की है?",
        ],
        symptom: "Headache",
        concern: "Recurring or persistent headaches",
        recommendation: "Review headache pattern, triggers, and neurological signs",
    },
    SymptomCategory {
        name: "stomach",
        keywords: &[
            "stomach", "abdomen", "abdominal", "belly", "nausea", "nauseous", "vomit", "vomiting",
            "diarrhea", "constipation", "bloating", "bloated", "indigestion", "पेट",
        ],
        questions: &[
            "Where in your abdomen do you feel the discomfort?",
            "Have you had any nausea, vomiting, or changes in bowel movements?",
            "Is the discomfort related to eating or particular foods?",
        ],
        questions_hi: &[
            "आपको पेट में परेशानी ठीक कहाँ महसूस होती है?",
            "क्या आपको मतली, उल्टी या मल त्याग में कोई बदलाव हुआ है?",
            "क्या यह परेशानी खाने या किसी खास भोजन से जुड़ी है?",
        ],
        symptom: "Gastrointestinal symptoms",
        concern: "Digestive discomfort",
        recommendation: "Review diet, bowel habits, and hydration",
    },
    SymptomCategory {
        name: "fatigue",
        keywords: &[
            "tired", "fatigue", "fatigued", "exhausted", "exhaustion", "weak", "weakness",
            "drained", "sleepy", "no energy", "low energy", "थकान", "कमजोरी",
        ],
        questions: &[
            "How long have you been feeling this tired?",
            "How are you sleeping at night?",
            "Is the tiredness affecting your daily activities?",
        ],
        questions_hi: &[
            "आप कितने समय से इतनी थकान महसूस कर रहे हैं?",
            "रात को आपकी नींद कैसी रहती है?",
            "क्या यह थकान आपकी दैनिक गतिविधियों को प्रभावित कर रही है?",
        ],
        symptom: "Fatigue or low energy",
        concern: "Reduced energy affecting daily life",
        recommendation: "Screen sleep quality, nutrition, and possible anemia",
    },
    SymptomCategory {
        name: "stress",
        keywords: &[
            "stress", "stressed", "stressful", "anxiety", "anxious", "worried", "worry",
            "worrying", "overwhelmed", "panic", "can't sleep", "तनाव", "चिंता",
        ],
        questions: &[
            "Can you tell me more about how you're feeling right now?",
            "Have you had any recent changes in lifestyle or stress?",
            "Are you experiencing any sleep difficulties?",
        ],
        questions_hi: &[
            "क्या आप मुझे बता सकते हैं कि आप अभी कैसा महसूस कर रहे हैं?",
            "क्या हाल ही में आपकी जीवनशैली या तनाव में कोई बदलाव आया है?",
            "क्या आपको नींद की कोई समस्या हो रही है?",
        ],
        symptom: "Stress or anxiety",
        concern: "Emotional strain or anxiety",
        recommendation: "Screen for anxiety and discuss coping and support options",
    },
];

/// Generic follow-up prompts used when no symptom group matches.
pub static GENERAL_QUESTIONS: &[&str] = &[
    "Can you tell me more about how you're feeling right now?",
    "When did you first notice these symptoms?",
    "Have you experienced anything like this before?",
    "Are you taking any medications currently?",
    "Is there anything that makes your symptoms better or worse?",
];

/// Hindi counterpart of [`GENERAL_QUESTIONS`].
pub static GENERAL_QUESTIONS_HI: &[&str] = &[
    "क्या आप मुझे बता सकते हैं कि आप अभी कैसा महसूस कर रहे हैं?",
    "आपने यह लक्षण पहली बार कब देखे थे?",
    "क्या आपने पहले भी कुछ इस तरह का अनुभव किया है?",
    "क्या आप वर्तमान में कोई दवाइयाँ ले रहे हैं?",
    "क्या कोई ऐसी चीज़ है जो आपके लक्षणों को बेहतर या बदतर बनाती है?",
];

pub fn general_questions(language: BankLanguage) -> &'static [&'static str] {
    match language {
        BankLanguage::English => GENERAL_QUESTIONS,
        BankLanguage::Hindi => GENERAL_QUESTIONS_HI,
    }
}

/// Return the first symptom group (in priority order) matching the text.
pub fn first_match(text: &str) -> Option<&'static SymptomCategory> {
    let words = tokenize(text);
    SYMPTOM_TAXONOMY.iter().find(|c| c.matches(&words))
}

/// Return every symptom group matching the text, in priority order.
pub fn all_matches(text: &str) -> Vec<&'static SymptomCategory> {
    let words = tokenize(text);
    SYMPTOM_TAXONOMY.iter().filter(|c| c.matches(&words)).collect()
}

/// Lower-case word tokens. Apostrophes inside words are kept so that
/// contractions like "can't" survive as one token.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('\u{2019}', "'")
        .split(|c: char| !is_word_char(c))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Devanagari vowel signs and the virama are not alphabetic, but they are
/// part of the word. The danda marks (U+0964, U+0965) end a phrase.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
        || c == '\''
        || matches!(c, '\u{0900}'..='\u{0963}' | '\u{0966}'..='\u{097F}')
}

/// Whether `phrase` (one or more space-separated words) occurs as a
/// contiguous run of whole tokens.
pub fn contains_phrase(words: &[String], phrase: &str) -> bool {
    let parts: Vec<&str> = phrase.split_whitespace().collect();
    if parts.is_empty() || parts.len() > words.len() {
        return false;
    }
    words
        .windows(parts.len())
        .any(|w| w.iter().zip(&parts).all(|(a, b)| a == b))
}
