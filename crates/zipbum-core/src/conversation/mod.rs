//! Conversation domain module.
//!
//! - `model`: conversation identity and list entries (`ConversationId`, `Conversation`)
//! - `message`: message types (`MessageRole`, `Message`)
//! - `directory`: the admin-side per-user grouping (`UserConversations`, `ConversationDirectory`)

mod directory;
mod message;
mod model;

pub use directory::{ConversationDirectory, UserConversations};
pub use message::{Message, MessageRole};
pub use model::{Conversation, ConversationId};
