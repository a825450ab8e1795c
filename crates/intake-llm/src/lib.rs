//! External collaborators reached over the network.
//!
//! Provides:
//! - The [`TextGenerator`] seam with a Gemini REST client, a disabled
//!   generator, and a scripted mock
//! - [`ResilientGenerator`], which applies a per-call timeout and retries
//!   rate-limited calls with exponential backoff
//! - The [`Transcriber`] seam for server-side audio transcription

pub mod error;
pub mod gemini;
pub mod generator;
pub mod retry;
pub mod transcriber;

pub use error::LlmError;
pub use gemini::GeminiClient;
pub use generator::{DisabledGenerator, GenerationRequest, MockGenerator, MockReply, TextGenerator};
pub use retry::{ResilientGenerator, RetryPolicy};
pub use transcriber::{MockTranscriber, Transcriber, UnavailableTranscriber};
