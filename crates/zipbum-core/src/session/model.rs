//! Client-side session state.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::conversation::ConversationId;

/// Position of the chat session in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    /// No active conversation; input disabled.
    Idle,
    /// Active conversation, input enabled, nothing in flight.
    Ready,
    /// Exactly one chat exchange in flight.
    Sending,
    /// The server blocked this conversation; input disabled until a new one is created.
    Blocked,
}

/// The session owned by one chat controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    active_conversation_id: Option<ConversationId>,
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self {
            active_conversation_id: None,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn active_conversation_id(&self) -> Option<&ConversationId> {
        self.active_conversation_id.as_ref()
    }

    pub fn is_sending(&self) -> bool {
        self.state == SessionState::Sending
    }

    pub fn is_blocked(&self) -> bool {
        self.state == SessionState::Blocked
    }

    /// Whether the input affordance is enabled.
    pub fn input_enabled(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Activates a conversation and enables input.
    pub fn activate(&mut self, conversation_id: ConversationId) {
        self.active_conversation_id = Some(conversation_id);
        self.state = SessionState::Ready;
    }

    /// Drops the active conversation and returns to `Idle`.
    pub fn reset(&mut self) {
        self.active_conversation_id = None;
        self.state = SessionState::Idle;
    }

    /// Moves to `state`, returning `true` when the state actually changed.
    pub fn transition(&mut self, state: SessionState) -> bool {
        if self.state == state {
            return false;
        }
        self.state = state;
        true
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
