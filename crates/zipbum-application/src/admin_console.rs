//! Admin Override Console: read and answer any user's conversation.

use std::sync::Arc;

use zipbum_core::api::{AdminSendRequest, ErrorReply, endpoints, pages};
use zipbum_core::conversation::{Conversation, ConversationDirectory, ConversationId, Message};
use zipbum_core::transport::{FormRequest, Method, Transport, TransportError, decode};
use zipbum_core::view::{NoticeLevel, UserSummary, ViewEvent};
use zipbum_core::{Result, ZipbumError};

use crate::publisher::ViewPublisher;
use crate::renderer::MessageRenderer;

pub const LOADING_MESSAGE: &str = "Loading messages...";
pub const NO_USERS_MESSAGE: &str = "No users found.";
pub const NO_CONVERSATIONS_MESSAGE: &str = "This user has no conversations.";
pub const NO_MESSAGES_MESSAGE: &str = "No messages in this conversation.";
pub const NO_CONVERSATION_SELECTED_MESSAGE: &str = "Select a conversation first.";
pub const TEACH_INCOMPLETE_MESSAGE: &str = "Both a question and an answer are needed.";
pub const KNOWLEDGE_ADDED_MESSAGE: &str = "Knowledge added.";

/// Admin intents the front end forwards to the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Reload,
    SelectUser(String),
    Back,
    SelectConversation(ConversationId),
    Send(String),
    Search(String),
    /// Adds a question and its answer to the knowledge base.
    Teach { question: String, answer: String },
    /// Grants admin rights to the user with this id.
    Promote(i64),
}

/// Which level of the two-level list is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminView {
    Users,
    UserConversations { email: String },
}

/// Drives the admin view over a bulk snapshot of every user's conversations.
///
/// Drill-down and back navigate the snapshot without touching the network;
/// only `load_all`, opening a conversation and sending do.
pub struct AdminConsole {
    transport: Arc<dyn Transport>,
    renderer: MessageRenderer,
    publisher: ViewPublisher,
    directory: ConversationDirectory,
    view: AdminView,
    current_conversation: Option<ConversationId>,
}

impl AdminConsole {
    pub fn new(transport: Arc<dyn Transport>, publisher: ViewPublisher) -> Self {
        Self {
            transport,
            renderer: MessageRenderer::new(publisher.clone()),
            publisher,
            directory: ConversationDirectory::default(),
            view: AdminView::Users,
            current_conversation: None,
        }
    }

    pub fn renderer(&self) -> &MessageRenderer {
        &self.renderer
    }

    pub fn directory(&self) -> &ConversationDirectory {
        &self.directory
    }

    pub fn view(&self) -> &AdminView {
        &self.view
    }

    pub fn current_conversation(&self) -> Option<&ConversationId> {
        self.current_conversation.as_ref()
    }

    /// Conversations of the user being shown, if any.
    pub fn visible_conversations(&self) -> &[Conversation] {
        match &self.view {
            AdminView::UserConversations { email } => self
                .directory
                .get(email)
                .map(|entry| entry.conversations.as_slice())
                .unwrap_or_default(),
            AdminView::Users => &[],
        }
    }

    pub async fn handle(&mut self, command: AdminCommand) {
        let result = match command {
            AdminCommand::Reload => self.load_all().await,
            AdminCommand::SelectUser(email) => self.select_user(&email),
            AdminCommand::Back => {
                self.back();
                Ok(())
            }
            AdminCommand::SelectConversation(id) => self.select_conversation(id).await,
            AdminCommand::Send(text) => match self.current_conversation.clone() {
                Some(id) => self.send_as_admin(&id, &text).await,
                None => {
                    self.notice(NoticeLevel::Warning, NO_CONVERSATION_SELECTED_MESSAGE);
                    Ok(())
                }
            },
            AdminCommand::Search(term) => {
                self.search_users(&term);
                Ok(())
            }
            AdminCommand::Teach { question, answer } => self.teach(&question, &answer).await,
            AdminCommand::Promote(user_id) => self.promote(user_id).await,
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "Admin command failed");
        }
    }

    /// Fetches the snapshot of every user's conversations and shows the user list.
    ///
    /// On failure the previous snapshot is kept.
    pub async fn load_all(&mut self) -> Result<()> {
        let directory: ConversationDirectory = match self
            .transport
            .call(Method::Get, endpoints::ALL_CONVERSATIONS, None)
            .await
            .and_then(decode)
        {
            Ok(directory) => directory,
            Err(err) => {
                self.notice(
                    NoticeLevel::Error,
                    &failure_text(&err, "Could not load conversations"),
                );
                return Err(err.into());
            }
        };

        tracing::debug!(users = directory.len(), "Admin snapshot loaded");
        self.directory = directory;
        self.view = AdminView::Users;
        self.publish_users(&self.summaries(""));
        Ok(())
    }

    /// Shows one user's conversations from the snapshot.
    pub fn select_user(&mut self, email: &str) -> Result<()> {
        let Some(entry) = self.directory.get(email) else {
            return Err(ZipbumError::not_found("user", email));
        };

        if entry.conversations.is_empty() {
            self.notice(NoticeLevel::Info, NO_CONVERSATIONS_MESSAGE);
        }
        self.publisher.publish(ViewEvent::UserConversationsListed {
            email: email.to_string(),
            username: entry.username.clone(),
            conversations: entry.conversations.clone(),
        });
        self.view = AdminView::UserConversations {
            email: email.to_string(),
        };
        Ok(())
    }

    /// Returns to the full user list and closes the open conversation.
    pub fn back(&mut self) {
        self.view = AdminView::Users;
        self.current_conversation = None;
        self.renderer.clear();
        self.publish_users(&self.summaries(""));
    }

    /// Filters the user list by username or email.
    pub fn search_users(&mut self, term: &str) -> Vec<UserSummary> {
        let users = self.summaries(term);
        self.view = AdminView::Users;
        self.publish_users(&users);
        users
    }

    /// Opens a conversation: clears the view and fetches its messages once.
    ///
    /// The conversation only becomes the send target once its messages load.
    pub async fn select_conversation(&mut self, id: ConversationId) -> Result<()> {
        let title = self
            .visible_conversations()
            .iter()
            .find(|conv| conv.id == id)
            .map(|conv| conv.title.clone());
        self.publisher.publish(ViewEvent::ConversationOpened {
            id: id.clone(),
            title,
        });
        self.reload_messages(&id).await
    }

    /// Posts `content` into the conversation as the assistant, then reloads it.
    ///
    /// Empty input is ignored.
    pub async fn send_as_admin(&mut self, id: &ConversationId, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(());
        }

        let body = AdminSendRequest {
            conversation_id: id.clone(),
            content: content.to_string(),
        }
        .into_body();
        if let Err(err) = self
            .transport
            .call(Method::Post, endpoints::ADMIN_SEND_MESSAGE, Some(body))
            .await
        {
            self.notice(
                NoticeLevel::Error,
                &failure_text(&err, "Could not send the message"),
            );
            return Err(err.into());
        }

        tracing::info!(conversation_id = %id, "Admin message sent");
        self.reload_messages(id).await
    }

    /// Adds a knowledge entry through the admin teach form.
    ///
    /// Both parts are trimmed; if either is empty nothing is sent.
    pub async fn teach(&mut self, question: &str, answer: &str) -> Result<()> {
        let (question, answer) = (question.trim(), answer.trim());
        if question.is_empty() || answer.is_empty() {
            self.notice(NoticeLevel::Warning, TEACH_INCOMPLETE_MESSAGE);
            return Ok(());
        }

        let request = FormRequest::post(endpoints::ADMIN_TEACH)
            .field("question", question)
            .field("answer", answer);
        self.submit_admin_form(request, "Could not add the knowledge entry").await?;

        tracing::info!(%question, "Knowledge entry added");
        self.notice(NoticeLevel::Info, KNOWLEDGE_ADDED_MESSAGE);
        Ok(())
    }

    /// Grants admin rights to a user by id.
    pub async fn promote(&mut self, user_id: i64) -> Result<()> {
        let request = FormRequest::post(endpoints::admin_promote(user_id));
        self.submit_admin_form(request, "Could not promote the user").await?;

        tracing::info!(user_id, "User promoted to admin");
        self.notice(NoticeLevel::Info, &format!("User {user_id} is now an admin."));
        Ok(())
    }

    async fn submit_admin_form(&self, request: FormRequest, fallback: &str) -> Result<()> {
        let result = match self.transport.submit(request).await {
            Ok(landed) => admin_landing(&landed),
            Err(err) => Err(err.into()),
        };
        if let Err(err) = &result {
            let text = match err {
                ZipbumError::Transport(err) => failure_text(err, fallback),
                other => format!("{fallback}: {other}"),
            };
            self.notice(NoticeLevel::Error, &text);
        }
        result
    }

    async fn reload_messages(&mut self, id: &ConversationId) -> Result<()> {
        self.renderer.clear();
        self.notice(NoticeLevel::Info, LOADING_MESSAGE);

        let messages: Vec<Message> = match self
            .transport
            .call(Method::Get, &endpoints::admin_messages(id), None)
            .await
            .and_then(decode)
        {
            Ok(messages) => messages,
            Err(err) => {
                self.current_conversation = None;
                self.notice(
                    NoticeLevel::Error,
                    &failure_text(&err, "Could not load messages"),
                );
                return Err(err.into());
            }
        };

        self.current_conversation = Some(id.clone());
        if messages.is_empty() {
            self.notice(NoticeLevel::Info, NO_MESSAGES_MESSAGE);
        }
        self.renderer.extend(messages);
        Ok(())
    }

    fn summaries(&self, term: &str) -> Vec<UserSummary> {
        self.directory
            .search(term)
            .into_iter()
            .map(|(email, entry)| UserSummary {
                email: email.to_string(),
                username: entry.username.clone(),
                conversation_count: entry.conversations.len(),
            })
            .collect()
    }

    fn publish_users(&self, users: &[UserSummary]) {
        if users.is_empty() {
            self.notice(NoticeLevel::Info, NO_USERS_MESSAGE);
        }
        self.publisher.publish(ViewEvent::UsersListed(users.to_vec()));
    }

    fn notice(&self, level: NoticeLevel, text: &str) {
        self.publisher.publish(ViewEvent::Notice {
            level,
            text: text.to_string(),
        });
    }
}

/// Admin forms redirect back to the admin page on success; any other page
/// means the session is gone or lacks admin rights.
fn admin_landing(landed: &str) -> Result<()> {
    match landed {
        pages::ADMIN => Ok(()),
        pages::LOGIN => Err(ZipbumError::auth("Login required")),
        _ => Err(ZipbumError::auth("Admin rights required")),
    }
}

/// The backend's `error` text when it sent one, else `fallback` with the cause.
fn failure_text(err: &TransportError, fallback: &str) -> String {
    match err {
        TransportError::Http { body, .. } => {
            ErrorReply::message_from(body).unwrap_or_else(|| format!("{fallback}: {err}"))
        }
        _ => format!("{fallback}: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::view_channel;
    use crate::test_support::{MockTransport, drain};
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;
    use zipbum_core::conversation::MessageRole;
    use zipbum_core::view::Entry;

    fn snapshot() -> serde_json::Value {
        json!({
            "maria@zip.com": {
                "username": "Maria",
                "conversations": [{"id": 1, "title": "boleto"}, {"id": 2, "title": "senha"}]
            },
            "ana@zip.com": {"username": "Ana Souza", "conversations": []}
        })
    }

    async fn loaded_console() -> (Arc<MockTransport>, AdminConsole, UnboundedReceiver<ViewEvent>) {
        let transport = Arc::new(MockTransport::new());
        transport.respond(endpoints::ALL_CONVERSATIONS, Ok(snapshot()));
        let (publisher, mut events) = view_channel();
        let mut console = AdminConsole::new(transport.clone(), publisher);
        console.load_all().await.unwrap();
        drain(&mut events);
        (transport, console, events)
    }

    fn contents(console: &AdminConsole) -> Vec<String> {
        console
            .renderer()
            .log()
            .entries()
            .iter()
            .filter_map(Entry::as_message)
            .map(|m| m.content.clone())
            .collect()
    }

    #[tokio::test]
    async fn load_all_lists_users_sorted_by_email() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(endpoints::ALL_CONVERSATIONS, Ok(snapshot()));
        let (publisher, mut events) = view_channel();
        let mut console = AdminConsole::new(transport.clone(), publisher);

        console.load_all().await.unwrap();

        match drain(&mut events).as_slice() {
            [ViewEvent::UsersListed(users)] => {
                assert_eq!(users[0].email, "ana@zip.com");
                assert_eq!(users[1].username, "Maria");
                assert_eq!(users[1].conversation_count, 2);
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[tokio::test]
    async fn selecting_a_user_makes_no_network_call() {
        let (transport, mut console, mut events) = loaded_console().await;
        let before = transport.calls().len();

        console.select_user("maria@zip.com").unwrap();

        assert_eq!(transport.calls().len(), before);
        assert_eq!(console.visible_conversations().len(), 2);
        match drain(&mut events).as_slice() {
            [ViewEvent::UserConversationsListed { username, conversations, .. }] => {
                assert_eq!(username, "Maria");
                assert_eq!(conversations[1].title, "senha");
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (_transport, mut console, _events) = loaded_console().await;

        let err = console.select_user("ghost@zip.com").unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(console.view(), &AdminView::Users);
    }

    #[tokio::test]
    async fn selecting_a_conversation_fetches_its_messages_once() {
        let (transport, mut console, mut events) = loaded_console().await;
        let id = ConversationId::from(1);
        transport.respond(
            &endpoints::admin_messages(&id),
            Ok(json!([
                {"role": "user", "content": "meu boleto"},
                {"role": "assistant", "content": "Qual o número?"}
            ])),
        );
        console.select_user("maria@zip.com").unwrap();
        drain(&mut events);

        console
            .handle(AdminCommand::SelectConversation(id.clone()))
            .await;

        assert_eq!(transport.calls_to(&endpoints::admin_messages(&id)).len(), 1);
        assert_eq!(contents(&console), vec!["meu boleto", "Qual o número?"]);
        let events = drain(&mut events);
        assert_eq!(
            events[0],
            ViewEvent::ConversationOpened {
                id,
                title: Some("boleto".to_string()),
            }
        );
        assert_eq!(events[1], ViewEvent::Cleared);
        assert_eq!(
            events[2],
            ViewEvent::Notice {
                level: NoticeLevel::Info,
                text: LOADING_MESSAGE.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn failed_fetch_shows_backend_error() {
        let (transport, mut console, mut events) = loaded_console().await;
        let id = ConversationId::from(2);
        transport.respond(
            &endpoints::admin_messages(&id),
            Err(TransportError::Http {
                status: 404,
                body: r#"{"error": "Conversa não encontrada"}"#.to_string(),
            }),
        );

        assert!(console.select_conversation(id).await.is_err());

        assert!(console.renderer().log().is_empty());
        assert!(drain(&mut events).contains(&ViewEvent::Notice {
            level: NoticeLevel::Error,
            text: "Conversa não encontrada".to_string(),
        }));
    }

    #[tokio::test]
    async fn send_as_admin_reloads_the_conversation() {
        let (transport, mut console, _events) = loaded_console().await;
        let id = ConversationId::from(1);
        transport
            .respond(
                &endpoints::admin_messages(&id),
                Ok(json!([{"role": "user", "content": "oi"}])),
            )
            .respond(
                &endpoints::admin_messages(&id),
                Ok(json!([
                    {"role": "user", "content": "oi"},
                    {"role": "assistant", "content": "Aqui é o suporte."}
                ])),
            )
            .respond(endpoints::ADMIN_SEND_MESSAGE, Ok(json!({"status": "ok"})));
        console.select_conversation(id.clone()).await.unwrap();

        console
            .handle(AdminCommand::Send(" Aqui é o suporte. ".to_string()))
            .await;

        let sent = transport.calls_to(endpoints::ADMIN_SEND_MESSAGE);
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].body,
            Some(json!({"conversation_id": 1, "content": "Aqui é o suporte."}))
        );
        assert_eq!(transport.calls_to(&endpoints::admin_messages(&id)).len(), 2);
        assert_eq!(contents(&console), vec!["oi", "Aqui é o suporte."]);
        let last = console.renderer().log().entries().last().and_then(Entry::as_message);
        assert_eq!(last.map(|m| m.role), Some(MessageRole::Assistant));
    }

    #[tokio::test]
    async fn failed_send_does_not_reload() {
        let (transport, mut console, mut events) = loaded_console().await;
        let id = ConversationId::from(1);
        transport.respond(&endpoints::admin_messages(&id), Ok(json!([])));
        console.select_conversation(id.clone()).await.unwrap();
        drain(&mut events);

        assert!(console.send_as_admin(&id, "olá").await.is_err());

        assert_eq!(transport.calls_to(&endpoints::admin_messages(&id)).len(), 1);
        assert!(matches!(
            drain(&mut events).as_slice(),
            [ViewEvent::Notice { level: NoticeLevel::Error, .. }]
        ));
    }

    #[tokio::test]
    async fn send_without_conversation_is_rejected_locally() {
        let (transport, mut console, _events) = loaded_console().await;

        console.handle(AdminCommand::Send("olá".to_string())).await;

        assert!(transport.calls_to(endpoints::ADMIN_SEND_MESSAGE).is_empty());
    }

    #[tokio::test]
    async fn back_restores_users_without_refetching() {
        let (transport, mut console, mut events) = loaded_console().await;
        let id = ConversationId::from(1);
        transport.respond(
            &endpoints::admin_messages(&id),
            Ok(json!([{"role": "user", "content": "oi"}])),
        );
        console.select_user("maria@zip.com").unwrap();
        console.select_conversation(id).await.unwrap();
        drain(&mut events);

        console.handle(AdminCommand::Back).await;

        assert_eq!(transport.calls_to(endpoints::ALL_CONVERSATIONS).len(), 1);
        assert_eq!(console.view(), &AdminView::Users);
        assert!(console.current_conversation().is_none());
        assert!(console.renderer().log().is_empty());
        match drain(&mut events).as_slice() {
            [ViewEvent::Cleared, ViewEvent::UsersListed(users)] => assert_eq!(users.len(), 2),
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_filters_by_username_or_email() {
        let (_transport, mut console, mut events) = loaded_console().await;

        let found = console.search_users("SOUZA");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].email, "ana@zip.com");

        assert_eq!(console.search_users("maria@").len(), 1);
        assert!(console.search_users("nobody").is_empty());
        assert!(drain(&mut events).contains(&ViewEvent::Notice {
            level: NoticeLevel::Info,
            text: NO_USERS_MESSAGE.to_string(),
        }));
    }

    #[tokio::test]
    async fn failed_open_clears_the_send_target() {
        let (transport, mut console, _events) = loaded_console().await;
        let first = ConversationId::from(1);
        let second = ConversationId::from(2);
        transport
            .respond(&endpoints::admin_messages(&first), Ok(json!([])))
            .respond(
                &endpoints::admin_messages(&second),
                Err(TransportError::network("connection reset")),
            );
        console.select_conversation(first).await.unwrap();

        assert!(console.select_conversation(second).await.is_err());
        console.handle(AdminCommand::Send("olá".to_string())).await;

        assert!(console.current_conversation().is_none());
        assert!(transport.calls_to(endpoints::ADMIN_SEND_MESSAGE).is_empty());
    }

    #[tokio::test]
    async fn teach_posts_the_trimmed_form() {
        let (transport, mut console, mut events) = loaded_console().await;
        transport.land(endpoints::ADMIN_TEACH, Ok(pages::ADMIN.to_string()));

        console
            .handle(AdminCommand::Teach {
                question: " Como gero a segunda via? ".to_string(),
                answer: "Pelo menu Boletos.".to_string(),
            })
            .await;

        let sent = transport.calls_to(endpoints::ADMIN_TEACH);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(
            sent[0].form,
            Some(vec![
                ("question".to_string(), "Como gero a segunda via?".to_string()),
                ("answer".to_string(), "Pelo menu Boletos.".to_string()),
            ])
        );
        assert_eq!(
            drain(&mut events),
            vec![ViewEvent::Notice {
                level: NoticeLevel::Info,
                text: KNOWLEDGE_ADDED_MESSAGE.to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn teach_without_answer_sends_nothing() {
        let (transport, mut console, mut events) = loaded_console().await;

        console.teach("Como gero a segunda via?", "  ").await.unwrap();

        assert!(transport.calls_to(endpoints::ADMIN_TEACH).is_empty());
        assert_eq!(
            drain(&mut events),
            vec![ViewEvent::Notice {
                level: NoticeLevel::Warning,
                text: TEACH_INCOMPLETE_MESSAGE.to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn promote_posts_to_the_user_route() {
        let (transport, mut console, mut events) = loaded_console().await;
        let endpoint = endpoints::admin_promote(4);
        transport.land(&endpoint, Ok(pages::ADMIN.to_string()));

        console.handle(AdminCommand::Promote(4)).await;

        let sent = transport.calls_to(&endpoint);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].form, Some(Vec::new()));
        assert_eq!(
            drain(&mut events),
            vec![ViewEvent::Notice {
                level: NoticeLevel::Info,
                text: "User 4 is now an admin.".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn promote_landing_on_chat_page_needs_admin_rights() {
        let (transport, mut console, mut events) = loaded_console().await;
        transport.land(&endpoints::admin_promote(4), Ok(pages::CHAT.to_string()));

        let err = console.promote(4).await.unwrap_err();

        assert_eq!(err, ZipbumError::auth("Admin rights required"));
        assert!(matches!(
            drain(&mut events).as_slice(),
            [ViewEvent::Notice { level: NoticeLevel::Error, .. }]
        ));
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_snapshot() {
        let (transport, mut console, _events) = loaded_console().await;
        transport.respond(
            endpoints::ALL_CONVERSATIONS,
            Err(TransportError::network("connection refused")),
        );

        console.handle(AdminCommand::Reload).await;

        assert_eq!(console.directory().len(), 2);
    }
}
