//! Intake API crate - axum HTTP server and route handlers.
//!
//! Provides the REST surface used by the browser front-end: session
//! lifecycle, follow-up question generation, conversation summaries, audio
//! upload, and health checks.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
