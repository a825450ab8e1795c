//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use intake_conversation::ConversationService;
use intake_core::IntakeConfig;
use intake_llm::Transcriber;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, fixed at startup.
    pub config: Arc<IntakeConfig>,
    /// Session store, emotion analyzer, and generators.
    pub service: Arc<ConversationService>,
    /// Backend for uploaded audio.
    pub transcriber: Arc<dyn Transcriber>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: IntakeConfig,
        service: ConversationService,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
            transcriber,
            start_time: Instant::now(),
        }
    }
}
