use thiserror::Error;
use uuid::Uuid;

/// Top-level error type for the intake engine.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for IntakeError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IntakeError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Session has no patient statements: {0}")]
    EmptySession(Uuid),

    #[error("Upstream collaborator timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl IntakeError {
    /// Machine-readable kind used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            IntakeError::SessionNotFound(_) => "session_not_found",
            IntakeError::EmptySession(_) => "empty_session",
            IntakeError::UpstreamTimeout(_) => "upstream_timeout",
            IntakeError::Storage(_) => "storage_error",
            IntakeError::Config(_) => "config_error",
            IntakeError::Io(_) => "io_error",
            IntakeError::Serialization(_) => "serialization_error",
        }
    }
}

impl From<toml::de::Error> for IntakeError {
    fn from(err: toml::de::Error) -> Self {
        IntakeError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for IntakeError {
    fn from(err: toml::ser::Error) -> Self {
        IntakeError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for IntakeError {
    fn from(err: serde_json::Error) -> Self {
        IntakeError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for intake operations.
pub type Result<T> = std::result::Result<T, IntakeError>;
