use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::model::Conversation;

/// One user's entry in the admin snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConversations {
    pub username: String,
    #[serde(default)]
    pub conversations: Vec<Conversation>,
}

/// Every user's conversations, keyed by email.
///
/// Keys iterate in sorted order, matching the order the backend emits them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationDirectory {
    users: BTreeMap<String, UserConversations>,
}

impl ConversationDirectory {
    pub fn new(users: BTreeMap<String, UserConversations>) -> Self {
        Self { users }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn get(&self, email: &str) -> Option<&UserConversations> {
        self.users.get(email)
    }

    /// Users in display order as `(email, entry)` pairs.
    pub fn users(&self) -> impl Iterator<Item = (&str, &UserConversations)> {
        self.users.iter().map(|(email, entry)| (email.as_str(), entry))
    }

    /// Case-insensitive substring match over username and email.
    ///
    /// An empty term matches every user.
    pub fn search(&self, term: &str) -> Vec<(&str, &UserConversations)> {
        let needle = term.trim().to_lowercase();
        self.users()
            .filter(|(email, entry)| {
                needle.is_empty()
                    || email.to_lowercase().contains(&needle)
                    || entry.username.to_lowercase().contains(&needle)
            })
            .collect()
    }
}
