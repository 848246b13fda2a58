//! Session Controller: the end-user chat state machine.
//!
//! ```text
//! Idle ──create──▶ Ready ──send──▶ Sending ──reply──▶ Ready
//!   │                ▲                 │
//!   │ 429            │ select          └──is_blocked──▶ Blocked
//!   └────────────────┴──────────────────────────────────▶ Blocked
//! ```
//!
//! `Blocked` only ends by creating a new conversation.

use std::sync::Arc;

use zipbum_core::api::{ChatReply, ChatRequest, TeachingRequest, endpoints, pages};
use zipbum_core::conversation::{Conversation, ConversationId, MessageRole};
use zipbum_core::session::{Session, SessionState};
use zipbum_core::transport::{FormRequest, Method, Transport, TransportError, decode};
use zipbum_core::view::{
    ActionEntry, ActionKind, Entry, EntryHandle, NoticeLevel, PendingHandle, ViewEvent,
};
use zipbum_core::{Result, ZipbumError};

use crate::conversation_store::ConversationStore;
use crate::publisher::ViewPublisher;
use crate::renderer::MessageRenderer;

pub const CONNECTION_ERROR_MESSAGE: &str = "Sorry, a connection error occurred.";
pub const BLOCKED_ON_CREATE_MESSAGE: &str = "You are blocked and cannot start a new chat.";
pub const CREATE_FAILED_MESSAGE: &str = "Could not start a new conversation.";
pub const EMPTY_HISTORY_MESSAGE: &str = "No saved chats yet.";
pub const LOAD_FAILED_MESSAGE: &str = "Could not load the conversation.";
pub const LOGGED_OUT_MESSAGE: &str = "Logged out.";
pub const LOGOUT_FAILED_MESSAGE: &str = "Could not log out.";

/// User intents the chat front end forwards to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    NewConversation,
    SelectConversation(ConversationId),
    Send(String),
    RefreshHistory,
    RequestTeaching(EntryHandle),
    Logout,
}

/// Why a send was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyInput,
    AlreadySending,
    NoActiveConversation,
    Blocked,
}

/// Result of one `send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing was rendered or sent.
    Ignored(IgnoreReason),
    /// The assistant answered; the session is `Ready` again.
    Answered,
    /// The server blocked the conversation. `teaching` is the suggest-teaching
    /// action, absent when the server also reported an outage.
    Blocked { teaching: Option<EntryHandle> },
    /// The exchange failed; the placeholder shows an error and the session is `Ready`.
    Failed(TransportError),
}

/// Result of activating a suggest-teaching action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeachingOutcome {
    Submitted,
    /// The request failed; the action stays clickable.
    NotSubmitted,
    /// The action was already used.
    AlreadySubmitted,
}

/// Drives one end-user chat view.
pub struct SessionController {
    transport: Arc<dyn Transport>,
    store: ConversationStore,
    renderer: MessageRenderer,
    publisher: ViewPublisher,
    session: Session,
}

impl SessionController {
    pub fn new(transport: Arc<dyn Transport>, publisher: ViewPublisher) -> Self {
        Self {
            store: ConversationStore::new(transport.clone()),
            renderer: MessageRenderer::new(publisher.clone()),
            transport,
            publisher,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn renderer(&self) -> &MessageRenderer {
        &self.renderer
    }

    pub fn history(&self) -> &[Conversation] {
        self.store.cached()
    }

    /// The most recent suggest-teaching action that can still be activated.
    pub fn pending_teaching_action(&self) -> Option<EntryHandle> {
        self.renderer
            .log()
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Action(ActionEntry { enabled: true, .. })))
            .map(|(handle, _)| handle)
            .last()
    }

    /// Dispatches one front-end intent.
    pub async fn handle(&mut self, command: ChatCommand) {
        match command {
            ChatCommand::NewConversation => {
                self.new_conversation().await;
            }
            ChatCommand::SelectConversation(id) => {
                if let Err(err) = self.select_conversation(id).await {
                    tracing::warn!(error = %err, "Conversation selection failed");
                }
            }
            ChatCommand::Send(text) => {
                self.send(&text).await;
            }
            ChatCommand::RefreshHistory => {
                self.refresh_history().await;
            }
            ChatCommand::RequestTeaching(action) => {
                if let Err(err) = self.request_teaching(action).await {
                    tracing::warn!(error = %err, "Teaching request ignored");
                }
            }
            ChatCommand::Logout => {
                if let Err(err) = self.logout().await {
                    tracing::warn!(error = %err, "Logout failed");
                }
            }
        }
    }

    /// Startup: opens a fresh conversation and loads the history list.
    pub async fn bootstrap(&mut self) -> SessionState {
        self.start_conversation().await;
        self.refresh_history().await;
        self.state()
    }

    /// Explicit "new chat": clears the view, then creates a conversation.
    pub async fn new_conversation(&mut self) -> SessionState {
        self.renderer.clear();
        self.start_conversation().await;
        self.state()
    }

    async fn start_conversation(&mut self) {
        match self.store.create_conversation().await {
            Ok(id) => {
                tracing::info!(conversation_id = %id, "Conversation created");
                self.renderer.show_welcome();
                self.activate(id.clone());
                self.publisher.publish(ViewEvent::ConversationOpened { id, title: None });
            }
            Err(ZipbumError::RateLimited) => {
                tracing::info!("Conversation creation refused: user is blocked");
                self.session.reset();
                self.set_state(SessionState::Blocked);
                self.notice(NoticeLevel::Warning, BLOCKED_ON_CREATE_MESSAGE);
            }
            Err(err) => {
                tracing::warn!(error = %err, "Conversation creation failed");
                self.session.reset();
                self.announce_state();
                self.notice(NoticeLevel::Error, CREATE_FAILED_MESSAGE);
            }
        }
    }

    /// Loads an existing conversation and makes it active.
    ///
    /// The previous view is cleared only once the new messages are available;
    /// on failure the view and session stay as they were.
    pub async fn select_conversation(&mut self, id: ConversationId) -> Result<()> {
        let messages = match self.store.fetch_messages(&id).await {
            Ok(messages) => messages,
            Err(err) => {
                tracing::warn!(conversation_id = %id, error = %err, "Failed to load conversation");
                self.notice(NoticeLevel::Error, LOAD_FAILED_MESSAGE);
                return Err(err);
            }
        };

        self.renderer.replace_all(messages);
        let title = self.store.title_of(&id).map(str::to_string);
        self.activate(id.clone());
        self.publisher
            .publish(ViewEvent::ConversationOpened { id, title });
        Ok(())
    }

    /// Sends one user message and renders the assistant's answer.
    pub async fn send(&mut self, input: &str) -> SendOutcome {
        let text = input.trim();
        if text.is_empty() {
            return SendOutcome::Ignored(IgnoreReason::EmptyInput);
        }
        match self.session.state() {
            SessionState::Sending => return SendOutcome::Ignored(IgnoreReason::AlreadySending),
            SessionState::Blocked => return SendOutcome::Ignored(IgnoreReason::Blocked),
            SessionState::Idle => return SendOutcome::Ignored(IgnoreReason::NoActiveConversation),
            SessionState::Ready => {}
        }
        let Some(conversation_id) = self.session.active_conversation_id().cloned() else {
            return SendOutcome::Ignored(IgnoreReason::NoActiveConversation);
        };

        self.renderer.append(MessageRole::User, text);
        let pending = self.renderer.append_pending(MessageRole::Assistant);
        self.set_state(SessionState::Sending);

        let request = ChatRequest {
            message: text.to_string(),
            conversation_id,
        };
        let result = self
            .transport
            .call(Method::Post, endpoints::CHAT, Some(request.into_body()))
            .await
            .and_then(decode::<ChatReply>);

        match reply_or_block(result) {
            Ok(reply) if reply.is_blocked => self.finish_blocked(pending, reply, text).await,
            Ok(reply) => {
                self.resolve(pending, &reply.response);
                self.set_state(SessionState::Ready);
                self.refresh_history().await;
                SendOutcome::Answered
            }
            Err(err) => {
                tracing::warn!(error = %err, "Chat exchange failed");
                self.resolve(pending, CONNECTION_ERROR_MESSAGE);
                self.set_state(SessionState::Ready);
                SendOutcome::Failed(err)
            }
        }
    }

    async fn finish_blocked(
        &mut self,
        pending: PendingHandle,
        reply: ChatReply,
        sent_text: &str,
    ) -> SendOutcome {
        self.resolve(pending, &reply.response);
        self.set_state(SessionState::Blocked);

        let teaching = if reply.site_down {
            tracing::info!("Service outage signaled; teaching suggestion suppressed");
            None
        } else {
            let question = reply
                .original_question
                .unwrap_or_else(|| sent_text.to_string());
            Some(
                self.renderer
                    .append_action(ActionKind::SuggestTeaching { question }),
            )
        };

        self.refresh_history().await;
        SendOutcome::Blocked { teaching }
    }

    /// Flags the action's question for human review.
    ///
    /// Fire-and-forget: a failure is only logged, and the action stays
    /// clickable.
    pub async fn request_teaching(&mut self, action: EntryHandle) -> Result<TeachingOutcome> {
        let question = match self.renderer.log().get(action) {
            Some(Entry::Action(ActionEntry {
                kind: ActionKind::SuggestTeaching { question },
                enabled,
            })) => {
                if !enabled {
                    return Ok(TeachingOutcome::AlreadySubmitted);
                }
                question.clone()
            }
            _ => return Err(ZipbumError::not_found("action", action.index().to_string())),
        };

        self.renderer.set_action_enabled(action, false)?;

        let body = TeachingRequest { question }.into_body();
        match self
            .transport
            .call(Method::Post, endpoints::REQUEST_TEACHING, Some(body))
            .await
        {
            Ok(_) => {
                tracing::info!("Teaching request submitted");
                Ok(TeachingOutcome::Submitted)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Teaching request failed");
                self.renderer.set_action_enabled(action, true)?;
                Ok(TeachingOutcome::NotSubmitted)
            }
        }
    }

    /// Refetches the history list; failures are logged and the old list kept.
    pub async fn refresh_history(&mut self) {
        match self.store.list_conversations().await {
            Ok(conversations) => {
                let conversations = conversations.to_vec();
                if conversations.is_empty() {
                    self.notice(NoticeLevel::Info, EMPTY_HISTORY_MESSAGE);
                }
                self.publisher
                    .publish(ViewEvent::HistoryReplaced(conversations));
            }
            Err(err) => tracing::warn!(error = %err, "Failed to load chat history"),
        }
    }

    /// Ends the backend session and drops everything tied to it.
    ///
    /// On failure the session is left as it was.
    pub async fn logout(&mut self) -> Result<()> {
        let landed = match self.transport.submit(FormRequest::get(endpoints::LOGOUT)).await {
            Ok(landed) => landed,
            Err(err) => {
                self.notice(NoticeLevel::Error, LOGOUT_FAILED_MESSAGE);
                return Err(err.into());
            }
        };
        if landed != pages::LOGIN {
            tracing::debug!(%landed, "Logout did not land on the login page");
        }

        self.renderer.clear();
        self.store.forget();
        self.publisher.publish(ViewEvent::HistoryReplaced(Vec::new()));
        let previous = self.session.state();
        self.session.reset();
        if previous != SessionState::Idle {
            self.announce_state();
        }
        tracing::info!("Logged out");
        self.notice(NoticeLevel::Info, LOGGED_OUT_MESSAGE);
        Ok(())
    }

    fn activate(&mut self, id: ConversationId) {
        let previous = self.session.state();
        self.session.activate(id);
        if previous != SessionState::Ready {
            self.announce_state();
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.session.transition(state) {
            self.announce_state();
        }
    }

    fn announce_state(&self) {
        let state = self.session.state();
        tracing::info!(%state, "Session state changed");
        self.publisher.publish(ViewEvent::StateChanged(state));
    }

    fn resolve(&mut self, pending: PendingHandle, text: &str) {
        // Only a cleared container can reject the handle, and nothing clears
        // it while an exchange is in flight.
        if let Err(err) = self.renderer.resolve(pending, text) {
            tracing::error!(error = %err, "Reply could not be rendered");
        }
    }

    fn notice(&self, level: NoticeLevel, text: &str) {
        self.publisher.publish(ViewEvent::Notice {
            level,
            text: text.to_string(),
        });
    }
}

/// A non-2xx chat answer whose body is still a blocked reply is the
/// server's block signal, not a transport failure.
fn reply_or_block(
    result: std::result::Result<ChatReply, TransportError>,
) -> std::result::Result<ChatReply, TransportError> {
    match result {
        Err(TransportError::Http { status, body }) => {
            match serde_json::from_str::<ChatReply>(&body) {
                Ok(reply) if reply.is_blocked => Ok(reply),
                _ => Err(TransportError::Http { status, body }),
            }
        }
        other => other,
    }
}
