use crate::conversation::{Conversation, ConversationId};
use crate::session::SessionState;

use super::entry::{Entry, NoticeLevel};
use super::log::EntryHandle;

/// One row of the admin user list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub email: String,
    pub username: String,
    pub conversation_count: usize,
}

/// Changes a controller publishes to its front end.
///
/// Events arrive in the order the changes happened; replaying them against
/// an empty view reproduces the controller's view state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    EntryAppended { handle: EntryHandle, entry: Entry },
    EntryUpdated { handle: EntryHandle, entry: Entry },
    /// The message container was emptied; earlier handles are stale.
    Cleared,
    WelcomeShown,
    WelcomeDismissed,
    /// The chat history list was replaced wholesale.
    HistoryReplaced(Vec<Conversation>),
    /// Admin sidebar shows the user list.
    UsersListed(Vec<UserSummary>),
    /// Admin sidebar shows one user's conversations.
    UserConversationsListed {
        email: String,
        username: String,
        conversations: Vec<Conversation>,
    },
    ConversationOpened {
        id: ConversationId,
        title: Option<String>,
    },
    StateChanged(SessionState),
    Notice { level: NoticeLevel, text: String },
}
