//! Wire types and paths of the backend HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::conversation::ConversationId;

/// Backend endpoint paths, relative to the configured base URL.
pub mod endpoints {
    use crate::conversation::ConversationId;

    pub const LOGIN: &str = "/templates/login.html";
    pub const LOGOUT: &str = "/logout";
    pub const ADMIN_TEACH: &str = "/admin/teach";
    pub const NEW_CONVERSATION: &str = "/api/new_conversation";
    pub const CONVERSATIONS: &str = "/api/get_conversations";
    pub const CHAT: &str = "/api/chat";
    pub const REQUEST_TEACHING: &str = "/api/request_teaching";
    pub const ALL_CONVERSATIONS: &str = "/api/get_all_conversations";
    pub const ADMIN_SEND_MESSAGE: &str = "/api/admin_send_message";

    pub fn messages(id: &ConversationId) -> String {
        format!("/api/get_messages/{id}")
    }

    pub fn admin_messages(id: &ConversationId) -> String {
        format!("/api/admin_get_messages/{id}")
    }

    pub fn admin_promote(user_id: i64) -> String {
        format!("/admin/promote/{user_id}")
    }
}

/// Pages the backend redirects form submissions to.
pub mod pages {
    pub const LOGIN: &str = super::endpoints::LOGIN;
    pub const CHAT: &str = "/templates/chat.html";
    pub const ADMIN: &str = "/templates/admin.html";
}

/// Answer of `POST /api/new_conversation`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewConversationReply {
    pub conversation_id: ConversationId,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: ConversationId,
}

impl ChatRequest {
    pub fn into_body(self) -> Value {
        json!({ "message": self.message, "conversation_id": self.conversation_id })
    }
}

/// Answer of `POST /api/chat`.
///
/// `is_blocked` and `site_down` are server signals, not failures: the
/// `response` text is always shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub site_down: bool,
    #[serde(default)]
    pub original_question: Option<String>,
}

/// Body of `POST /api/request_teaching`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeachingRequest {
    pub question: String,
}

impl TeachingRequest {
    pub fn into_body(self) -> Value {
        json!({ "question": self.question })
    }
}

/// Body of `POST /api/admin_send_message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminSendRequest {
    pub conversation_id: ConversationId,
    pub content: String,
}

impl AdminSendRequest {
    pub fn into_body(self) -> Value {
        json!({ "conversation_id": self.conversation_id, "content": self.content })
    }
}

/// Error envelope the backend uses on non-2xx answers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}

impl ErrorReply {
    /// Extracts the `error` field from a raw error body, if present.
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorReply>(body)
            .ok()
            .map(|reply| reply.error)
    }
}
