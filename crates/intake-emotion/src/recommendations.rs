//! Clinician-facing recommendations keyed by (emotion, alert level).

use intake_core::{AlertLevel, PrimaryEmotion};

pub const STABLE: &str = "Patient emotional state appears stable";

fn emotion_line(emotion: PrimaryEmotion) -> Option<&'static str> {
    match emotion {
        PrimaryEmotion::Distressed => {
            Some("Patient showing signs of distress: check vital signs and immediate concerns")
        }
        PrimaryEmotion::Anxious => {
            Some("Patient showing anxiety: provide reassurance and clear information")
        }
        PrimaryEmotion::Sad => {
            Some("Patient showing sadness: offer emotional support and check mental wellbeing")
        }
        PrimaryEmotion::Angry => {
            Some("Patient appears frustrated: acknowledge their feelings and listen actively")
        }
        PrimaryEmotion::Confused => {
            Some("Patient appears confused: simplify explanations and confirm understanding")
        }
        PrimaryEmotion::Calm => {
            Some("Patient appears calm: good opportunity for detailed discussion")
        }
        PrimaryEmotion::Neutral => None,
    }
}

fn alert_line(alert: AlertLevel) -> Option<&'static str> {
    match alert {
        AlertLevel::High => {
            Some("Escalate: assess immediate safety and vital signs, consider urgent review")
        }
        AlertLevel::Medium => Some("Explore the reported symptoms further and monitor closely"),
        AlertLevel::Low => Some("Acknowledge the patient's concern and continue monitoring"),
        AlertLevel::None => None,
    }
}

/// Ordered recommendations for an emotion at an alert level.
///
/// Never empty.
pub fn recommendations_for(emotion: PrimaryEmotion, alert: AlertLevel) -> Vec<String> {
    let mut out: Vec<String> = emotion_line(emotion)
        .into_iter()
        .chain(alert_line(alert))
        .map(str::to_string)
        .collect();
    if out.is_empty() {
        out.push(STABLE.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_none_is_stable() {
        assert_eq!(
            recommendations_for(PrimaryEmotion::Neutral, AlertLevel::None),
            vec![STABLE.to_string()]
        );
    }

    #[test]
    fn test_calm_has_own_line() {
        let recs = recommendations_for(PrimaryEmotion::Calm, AlertLevel::None);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("good opportunity"));
    }

    #[test]
    fn test_emotion_line_precedes_alert_line() {
        let recs = recommendations_for(PrimaryEmotion::Distressed, AlertLevel::High);
        assert_eq!(recs.len(), 2);
        assert!(recs[0].contains("distress"));
        assert!(recs[1].starts_with("Escalate"));
    }

    #[test]
    fn test_neutral_with_alert_has_only_alert_line() {
        let recs = recommendations_for(PrimaryEmotion::Neutral, AlertLevel::Low);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("continue monitoring"));
    }

    #[test]
    fn test_fixed_table_is_stable_across_calls() {
        assert_eq!(
            recommendations_for(PrimaryEmotion::Anxious, AlertLevel::Medium),
            recommendations_for(PrimaryEmotion::Anxious, AlertLevel::Medium)
        );
    }
}
