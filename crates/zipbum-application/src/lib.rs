//! Application layer for the ZIPBUM client.
//!
//! Controllers that turn user intents into transport calls and publish the
//! resulting view changes. Each controller owns its own message renderer.

pub mod admin_console;
pub mod conversation_store;
pub mod publisher;
pub mod renderer;
pub mod session_controller;

#[cfg(test)]
mod test_support;

pub use admin_console::{AdminCommand, AdminConsole, AdminView};
pub use conversation_store::ConversationStore;
pub use publisher::{ViewPublisher, view_channel};
pub use renderer::MessageRenderer;
pub use session_controller::{
    ChatCommand, IgnoreReason, SendOutcome, SessionController, TeachingOutcome,
};
