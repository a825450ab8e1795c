//! In-memory session store.
//!
//! Sessions live in a map guarded by a read/write lock that is held only for
//! lookup, insert, and removal. Each session has its own mutex, so appends to
//! one session serialize while other sessions proceed independently.

pub mod error;
pub mod store;

pub use error::SessionError;
pub use store::{Appended, SessionStore};
