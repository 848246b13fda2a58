use strum::Display;

use crate::conversation::{Message, MessageRole};

/// A message bubble in the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    pub role: MessageRole,
    pub content: String,
    /// Set while the entry is a pending placeholder.
    pub loading: bool,
}

impl From<Message> for MessageEntry {
    fn from(message: Message) -> Self {
        Self {
            role: message.role,
            content: message.content,
            loading: false,
        }
    }
}

/// What an action entry does when activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Flag an unanswered question for human review.
    SuggestTeaching { question: String },
}

/// A clickable affordance rendered inline after a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEntry {
    pub kind: ActionKind,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Message(MessageEntry),
    Action(ActionEntry),
}

impl Entry {
    pub fn as_message(&self) -> Option<&MessageEntry> {
        match self {
            Self::Message(message) => Some(message),
            Self::Action(_) => None,
        }
    }

    pub fn as_action(&self) -> Option<&ActionEntry> {
        match self {
            Self::Action(action) => Some(action),
            Self::Message(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.as_message().is_some_and(|message| message.loading)
    }
}

/// Severity of a transient banner shown outside the message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}
