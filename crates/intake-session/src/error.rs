//! Error types for the session store.

use intake_core::IntakeError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(Uuid),
    #[error("session capacity of {0} reached")]
    CapacityReached(usize),
    #[error("session lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<SessionError> for IntakeError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => IntakeError::SessionNotFound(id),
            other => IntakeError::Storage(other.to_string()),
        }
    }
}
