//! Session domain module.
//!
//! Holds the chat session's lifecycle state (`Session`, `SessionState`).

mod model;

pub use model::{Session, SessionState};
