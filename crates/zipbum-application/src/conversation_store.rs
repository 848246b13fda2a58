//! Conversation Store: read-through cache of the user's conversation list.

use std::sync::Arc;

use zipbum_core::api::{NewConversationReply, endpoints};
use zipbum_core::conversation::{Conversation, ConversationId, Message};
use zipbum_core::transport::{Method, Transport, decode};
use zipbum_core::{Result, ZipbumError};

/// Holds the last fetched conversation list.
///
/// Nothing is persisted; every `list_conversations` call refetches the whole
/// list and swaps it in only once it has fully decoded.
pub struct ConversationStore {
    transport: Arc<dyn Transport>,
    conversations: Vec<Conversation>,
}

impl ConversationStore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            conversations: Vec::new(),
        }
    }

    /// The cached list, in backend order.
    pub fn cached(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn title_of(&self, id: &ConversationId) -> Option<&str> {
        self.conversations
            .iter()
            .find(|conv| &conv.id == id)
            .map(|conv| conv.title.as_str())
    }

    /// Drops the cached list, e.g. after the user logs out.
    pub fn forget(&mut self) {
        self.conversations.clear();
    }

    /// Fetches the full list and replaces the cache.
    ///
    /// On failure the previous cache is kept untouched.
    pub async fn list_conversations(&mut self) -> Result<&[Conversation]> {
        let value = self
            .transport
            .call(Method::Get, endpoints::CONVERSATIONS, None)
            .await?;
        let conversations: Vec<Conversation> = decode(value)?;

        tracing::debug!(count = conversations.len(), "Conversation list refreshed");
        self.conversations = conversations;
        Ok(&self.conversations)
    }

    /// Asks the backend for a new conversation.
    ///
    /// # Errors
    ///
    /// - `ZipbumError::RateLimited` when the backend answers 429
    /// - `ZipbumError::Transport` for any other failure
    pub async fn create_conversation(&self) -> Result<ConversationId> {
        let value = match self
            .transport
            .call(Method::Post, endpoints::NEW_CONVERSATION, None)
            .await
        {
            Ok(value) => value,
            Err(err) if err.is_rate_limited() => return Err(ZipbumError::RateLimited),
            Err(err) => return Err(err.into()),
        };

        let reply: NewConversationReply = decode(value)?;
        Ok(reply.conversation_id)
    }

    /// Fetches a conversation's messages in backend order.
    pub async fn fetch_messages(&self, id: &ConversationId) -> Result<Vec<Message>> {
        let value = self
            .transport
            .call(Method::Get, &endpoints::messages(id), None)
            .await?;
        Ok(decode(value)?)
    }
}
