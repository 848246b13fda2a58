use thiserror::Error;

use crate::conversation::MessageRole;

use super::entry::{ActionEntry, ActionKind, Entry, MessageEntry};

/// Violations of the message container's invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The handle was issued before the last `clear()`.
    #[error("Entry handle is stale (container was cleared)")]
    StaleHandle,

    /// The entry is not a pending placeholder.
    #[error("Entry is not a pending placeholder")]
    NotPending,

    /// The entry is not an action.
    #[error("Entry is not an action")]
    NotAction,
}

/// Position of an entry in a `MessageLog`, valid until the next `clear()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle {
    generation: u64,
    index: usize,
}

impl EntryHandle {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Handle to a pending placeholder.
///
/// Neither `Copy` nor `Clone`: `MessageLog::resolve` consumes it, so a
/// placeholder can be resolved at most once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending placeholder must be resolved exactly once"]
pub struct PendingHandle(EntryHandle);

impl PendingHandle {
    pub fn entry(&self) -> EntryHandle {
        self.0
    }
}

/// Ordered contents of one message container.
#[derive(Debug, Default)]
pub struct MessageLog {
    generation: u64,
    entries: Vec<Entry>,
    welcome: bool,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn welcome_visible(&self) -> bool {
        self.welcome
    }

    pub fn get(&self, handle: EntryHandle) -> Option<&Entry> {
        if handle.generation != self.generation {
            return None;
        }
        self.entries.get(handle.index)
    }

    /// Entries paired with the handles that currently address them.
    pub fn iter(&self) -> impl Iterator<Item = (EntryHandle, &Entry)> + '_ {
        let generation = self.generation;
        self.entries
            .iter()
            .enumerate()
            .map(move |(index, entry)| (EntryHandle { generation, index }, entry))
    }

    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_pending()).count()
    }

    pub fn append(&mut self, role: MessageRole, content: impl Into<String>) -> EntryHandle {
        self.push(Entry::Message(MessageEntry {
            role,
            content: content.into(),
            loading: false,
        }))
    }

    pub fn append_pending(&mut self, role: MessageRole) -> PendingHandle {
        PendingHandle(self.push(Entry::Message(MessageEntry {
            role,
            content: String::new(),
            loading: true,
        })))
    }

    pub fn append_action(&mut self, kind: ActionKind) -> EntryHandle {
        self.push(Entry::Action(ActionEntry {
            kind,
            enabled: true,
        }))
    }

    /// Replaces the placeholder's indicator with `text`.
    pub fn resolve(
        &mut self,
        pending: PendingHandle,
        text: impl Into<String>,
    ) -> Result<EntryHandle, RenderError> {
        let handle = pending.0;
        let entry = self.entry_mut(handle)?;
        match entry {
            Entry::Message(message) if message.loading => {
                message.loading = false;
                message.content = text.into();
                Ok(handle)
            }
            _ => Err(RenderError::NotPending),
        }
    }

    pub fn set_action_enabled(
        &mut self,
        handle: EntryHandle,
        enabled: bool,
    ) -> Result<(), RenderError> {
        match self.entry_mut(handle)? {
            Entry::Action(action) => {
                action.enabled = enabled;
                Ok(())
            }
            Entry::Message(_) => Err(RenderError::NotAction),
        }
    }

    /// Empties the container and invalidates every outstanding handle.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.welcome = false;
        self.generation += 1;
    }

    pub fn show_welcome(&mut self) {
        self.welcome = true;
    }

    /// Hides the welcome placeholder, returning whether it was visible.
    pub fn dismiss_welcome(&mut self) -> bool {
        std::mem::replace(&mut self.welcome, false)
    }

    fn push(&mut self, entry: Entry) -> EntryHandle {
        self.entries.push(entry);
        EntryHandle {
            generation: self.generation,
            index: self.entries.len() - 1,
        }
    }

    fn entry_mut(&mut self, handle: EntryHandle) -> Result<&mut Entry, RenderError> {
        if handle.generation != self.generation {
            return Err(RenderError::StaleHandle);
        }
        self.entries
            .get_mut(handle.index)
            .ok_or(RenderError::StaleHandle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_placeholder_resolves_in_place() {
        let mut log = MessageLog::new();
        log.append(MessageRole::User, "oi");
        let pending = log.append_pending(MessageRole::Assistant);
        assert_eq!(log.pending_count(), 1);

        let handle = log.resolve(pending, "olá!").unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(log.pending_count(), 0);
        let entry = log.get(handle).and_then(Entry::as_message).unwrap();
        assert_eq!(entry.content, "olá!");
        assert!(!entry.loading);
    }

    #[test]
    fn resolving_after_clear_reports_stale_handle() {
        let mut log = MessageLog::new();
        let pending = log.append_pending(MessageRole::Assistant);
        log.clear();

        assert_eq!(log.resolve(pending, "late"), Err(RenderError::StaleHandle));
        assert!(log.is_empty());
    }

    #[test]
    fn handles_from_previous_generation_do_not_alias_new_entries() {
        let mut log = MessageLog::new();
        let old = log.append(MessageRole::User, "first");
        log.clear();
        log.append(MessageRole::User, "second");

        assert!(log.get(old).is_none());
    }

    #[test]
    fn action_toggle_rejects_message_entries() {
        let mut log = MessageLog::new();
        let message = log.append(MessageRole::Assistant, "sem resposta");
        let action = log.append_action(ActionKind::SuggestTeaching {
            question: "xyz".to_string(),
        });

        log.set_action_enabled(action, false).unwrap();
        assert!(!log.get(action).and_then(Entry::as_action).unwrap().enabled);
        assert_eq!(log.set_action_enabled(message, false), Err(RenderError::NotAction));
    }

    #[test]
    fn iter_yields_live_handles() {
        let mut log = MessageLog::new();
        log.append(MessageRole::User, "stale");
        log.clear();
        log.append(MessageRole::User, "a");
        log.append(MessageRole::Assistant, "b");

        let handles: Vec<EntryHandle> = log.iter().map(|(handle, _)| handle).collect();
        assert_eq!(handles.len(), 2);
        assert!(handles.iter().all(|handle| log.get(*handle).is_some()));
    }

    #[test]
    fn welcome_is_dismissed_once() {
        let mut log = MessageLog::new();
        log.show_welcome();
        assert!(log.dismiss_welcome());
        assert!(!log.dismiss_welcome());
    }
}
