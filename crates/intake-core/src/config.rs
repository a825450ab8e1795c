use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{IntakeError, Result};

/// Top-level configuration for the intake service.
///
/// Loaded from `~/.intake/config.toml` by default. Each section corresponds
/// to one crate of the workspace or a cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntakeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub emotion: EmotionConfig,
    #[serde(default)]
    pub question: QuestionConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl IntakeConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: IntakeConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| IntakeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Allowed CORS origins. Empty allows any origin.
    pub allowed_origins: Vec<String>,
    /// Directory holding the browser front-end, served at `/` when set.
    pub static_dir: Option<String>,
    /// Maximum request body size in bytes (audio uploads included).
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            allowed_origins: Vec::new(),
            static_dir: None,
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Session store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle minutes after which a session is purged.
    pub ttl_minutes: u32,
    /// Seconds between expiry sweeps.
    pub sweep_interval_secs: u64,
    /// Maximum number of live sessions.
    pub max_sessions: usize,
    /// Language tag used when a client does not send one.
    pub default_language: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 120,
            sweep_interval_secs: 60,
            max_sessions: 10_000,
            default_language: "en-US".to_string(),
        }
    }
}

/// Emotion analyzer thresholds on the compound score.
///
/// Keyword groups mark candidates; these bands decide labels and alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    /// At or below: strongly negative (distressed label, HIGH with pain intensity).
    pub strong_negative: f64,
    /// At or below: moderately negative (MEDIUM with symptom keywords).
    pub moderate_negative: f64,
    /// At or below: mildly negative (LOW).
    pub mild_negative: f64,
    /// At or below: negative sentiment.
    pub negative: f64,
    /// At or above: positive sentiment.
    pub positive: f64,
    /// At or above: strongly positive (calm label without keywords).
    pub strong_positive: f64,
    /// Per-emotion proportion above which each keyword match counts double.
    /// Calm is measured on `pos`, every other emotion on `neg`.
    pub weights: EmotionWeights,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            strong_negative: -0.5,
            moderate_negative: -0.3,
            mild_negative: -0.05,
            negative: -0.05,
            positive: 0.05,
            strong_positive: 0.5,
            weights: EmotionWeights::default(),
        }
    }
}

/// Double-weight thresholds for the emotion keyword groups. Confused
/// matches always count once and has no entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionWeights {
    pub distressed: f64,
    pub anxious: f64,
    pub sad: f64,
    pub angry: f64,
    pub calm: f64,
}

impl Default for EmotionWeights {
    fn default() -> Self {
        Self {
            distressed: 0.5,
            anxious: 0.3,
            sad: 0.6,
            angry: 0.7,
            calm: 0.3,
        }
    }
}

/// Follow-up question settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionConfig {
    /// Number of follow-up questions to return (1 to 3).
    pub question_count: usize,
    /// Most recent turns included in the generation prompt.
    pub history_window: usize,
    /// Maximum output tokens requested from the generator.
    pub max_output_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for QuestionConfig {
    fn default() -> Self {
        Self {
            question_count: 3,
            history_window: 10,
            max_output_tokens: 100,
            temperature: 0.7,
        }
    }
}

/// Conversation summary settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// History length at which generate-question attaches a brief summary.
    pub brief_summary_min_turns: usize,
    /// Most recent turns included in a brief summary.
    pub brief_history_window: usize,
    /// Maximum output tokens for a comprehensive summary.
    pub max_output_tokens: u32,
    /// Maximum output tokens for a brief summary.
    pub brief_max_output_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            brief_summary_min_turns: 4,
            brief_history_window: 10,
            max_output_tokens: 300,
            brief_max_output_tokens: 150,
            temperature: 0.3,
        }
    }
}

/// Generative-text collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider: "gemini" or "disabled".
    pub provider: String,
    /// Model name.
    pub model: String,
    /// REST base URL.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Attempts made when the provider reports a rate limit.
    pub max_retries: u32,
    /// Upper bound on a single retry backoff in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            request_timeout_ms: 10_000,
            max_retries: 3,
            max_backoff_ms: 60_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = IntakeConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.max_body_bytes, 16 * 1024 * 1024);
        assert_eq!(config.session.default_language, "en-US");
        assert_eq!(config.question.question_count, 3);
        assert_eq!(config.summary.brief_summary_min_turns, 4);
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.llm.max_retries, 3);
    }

    #[test]
    fn test_emotion_threshold_bands_are_ordered() {
        let e = EmotionConfig::default();
        assert!(e.strong_negative < e.moderate_negative);
        assert!(e.moderate_negative < e.mild_negative);
        assert!(e.mild_negative < e.positive);
        assert!(e.negative < e.positive);
        assert!(e.positive < e.strong_positive);
    }

    #[test]
    fn test_emotion_weights_load_from_nested_table() {
        let content = r#"
[emotion]
negative = -0.2

[emotion.weights]
sad = 0.4
"#;
        let file = create_temp_config(content);
        let config = IntakeConfig::load(file.path()).unwrap();
        assert!((config.emotion.negative + 0.2).abs() < f64::EPSILON);
        // The LOW alert band is configured on its own.
        assert!((config.emotion.mild_negative + 0.05).abs() < f64::EPSILON);
        assert!((config.emotion.weights.sad - 0.4).abs() < f64::EPSILON);
        assert!((config.emotion.weights.anxious - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[server]
host = "0.0.0.0"
port = 8080
allowed_origins = ["http://localhost:3000"]
static_dir = "frontend"

[session]
ttl_minutes = 30
max_sessions = 50

[emotion]
strong_negative = -0.6

[llm]
provider = "disabled"
request_timeout_ms = 2500
"#;
        let file = create_temp_config(content);
        let config = IntakeConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.server.static_dir.as_deref(), Some("frontend"));
        assert_eq!(config.session.ttl_minutes, 30);
        assert_eq!(config.session.max_sessions, 50);
        assert!((config.emotion.strong_negative + 0.6).abs() < f64::EPSILON);
        // Unset fields in a present section keep their defaults.
        assert!((config.emotion.moderate_negative + 0.3).abs() < f64::EPSILON);
        assert_eq!(config.llm.provider, "disabled");
        assert_eq!(config.llm.request_timeout_ms, 2500);
        assert_eq!(config.llm.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let file = create_temp_config("[question]\nquestion_count = 1\n");
        let config = IntakeConfig::load(file.path()).unwrap();
        assert_eq!(config.question.question_count, 1);
        assert_eq!(config.question.history_window, 10);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_load_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = IntakeConfig::load(file.path()).unwrap();
        assert_eq!(config.session.ttl_minutes, 120);
        assert!(config.server.static_dir.is_none());
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        let result = IntakeConfig::load(file.path());
        assert!(matches!(result, Err(IntakeError::Config(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = IntakeConfig::load_or_default(Path::new("/nonexistent/intake.toml"));
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = IntakeConfig::default();
        config.server.port = 9100;
        config.save(&path).unwrap();

        assert!(path.exists());
        let reloaded = IntakeConfig::load(&path).unwrap();
        assert_eq!(reloaded.server.port, 9100);
        assert_eq!(reloaded.llm.api_key_env, "GEMINI_API_KEY");
    }
}
