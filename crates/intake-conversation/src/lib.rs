//! Conversation engine: follow-up questions, summaries, and the service that
//! composes them with the session store and emotion analyzer.

pub mod question;
pub mod service;
pub mod summary;

pub use question::{fallback_questions, QuestionGenerator, REPEAT_PROMPT};
pub use service::{ConversationService, QuestionOutcome, SessionView};
pub use summary::SummaryGenerator;
