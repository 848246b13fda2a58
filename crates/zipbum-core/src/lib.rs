//! Domain layer of the ZIPBUM client: conversations, messages, session
//! state, the message view model and the traits infrastructure implements.

pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod preference;
pub mod session;
pub mod transport;
pub mod view;

// Re-export common error type
pub use error::{Result, ZipbumError};
