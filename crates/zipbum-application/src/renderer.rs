//! Message Renderer: one message container plus its published mirror.

use zipbum_core::conversation::{Message, MessageRole};
use zipbum_core::view::{
    ActionKind, EntryHandle, MessageLog, PendingHandle, RenderError, ViewEvent,
};

use crate::publisher::ViewPublisher;

/// Owns one `MessageLog` and publishes every change to it.
///
/// Each controller creates its own renderer; renderers are never shared.
/// Every mutation is followed by the view following the newest entry, so
/// the user's scroll position is not preserved.
pub struct MessageRenderer {
    log: MessageLog,
    publisher: ViewPublisher,
}

impl MessageRenderer {
    pub fn new(publisher: ViewPublisher) -> Self {
        Self {
            log: MessageLog::new(),
            publisher,
        }
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn append(&mut self, role: MessageRole, content: impl Into<String>) -> EntryHandle {
        self.dismiss_welcome();
        let handle = self.log.append(role, content);
        self.publish_appended(handle);
        handle
    }

    /// Appends a placeholder that shows a working indicator until resolved.
    pub fn append_pending(&mut self, role: MessageRole) -> PendingHandle {
        self.dismiss_welcome();
        let pending = self.log.append_pending(role);
        self.publish_appended(pending.entry());
        pending
    }

    pub fn append_action(&mut self, kind: ActionKind) -> EntryHandle {
        let handle = self.log.append_action(kind);
        self.publish_appended(handle);
        handle
    }

    /// Replaces a placeholder's indicator with its final text.
    pub fn resolve(
        &mut self,
        pending: PendingHandle,
        text: impl Into<String>,
    ) -> Result<EntryHandle, RenderError> {
        let handle = self.log.resolve(pending, text).inspect_err(|err| {
            tracing::error!(error = %err, "Pending placeholder could not be resolved");
        })?;
        self.publish_updated(handle);
        Ok(handle)
    }

    pub fn set_action_enabled(
        &mut self,
        handle: EntryHandle,
        enabled: bool,
    ) -> Result<(), RenderError> {
        self.log.set_action_enabled(handle, enabled)?;
        self.publish_updated(handle);
        Ok(())
    }

    /// Empties the container.
    pub fn clear(&mut self) {
        self.log.clear();
        self.publisher.publish(ViewEvent::Cleared);
    }

    /// Clears the container and renders `messages` in the given order.
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.clear();
        self.extend(messages);
    }

    /// Appends `messages` in the given order.
    pub fn extend(&mut self, messages: Vec<Message>) {
        for message in messages {
            self.append(message.role, message.content);
        }
    }

    pub fn show_welcome(&mut self) {
        self.log.show_welcome();
        self.publisher.publish(ViewEvent::WelcomeShown);
    }

    fn dismiss_welcome(&mut self) {
        if self.log.dismiss_welcome() {
            self.publisher.publish(ViewEvent::WelcomeDismissed);
        }
    }

    fn publish_appended(&self, handle: EntryHandle) {
        if let Some(entry) = self.log.get(handle) {
            self.publisher.publish(ViewEvent::EntryAppended {
                handle,
                entry: entry.clone(),
            });
        }
    }

    fn publish_updated(&self, handle: EntryHandle) {
        if let Some(entry) = self.log.get(handle) {
            self.publisher.publish(ViewEvent::EntryUpdated {
                handle,
                entry: entry.clone(),
            });
        }
    }
}
