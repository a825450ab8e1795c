//! Shared domain types, configuration, and errors for the intake engine.

pub mod config;
pub mod error;
pub mod taxonomy;
pub mod types;

pub use config::IntakeConfig;
pub use error::{IntakeError, Result};
pub use taxonomy::{SymptomCategory, SYMPTOM_TAXONOMY};
pub use types::*;
