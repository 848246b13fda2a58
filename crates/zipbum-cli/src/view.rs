//! Terminal rendering of controller view events.

use colored::{Color, Colorize};
use zipbum_core::conversation::{Conversation, ConversationId, MessageRole};
use zipbum_core::preference::Theme;
use zipbum_core::session::SessionState;
use zipbum_core::view::{
    ActionEntry, ActionKind, Entry, MessageEntry, NoticeLevel, UserSummary, ViewEvent,
};

const WELCOME: &str = "Olá! I'm the ZIPBUM assistant. Ask me anything.";

struct Palette {
    user: Color,
    assistant: Color,
    action: Color,
    muted: Color,
    header: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                user: Color::BrightGreen,
                assistant: Color::BrightBlue,
                action: Color::BrightYellow,
                muted: Color::BrightBlack,
                header: Color::BrightMagenta,
            },
            Theme::Light => Self {
                user: Color::Green,
                assistant: Color::Blue,
                action: Color::Yellow,
                muted: Color::Black,
                header: Color::Magenta,
            },
        }
    }
}

/// Prints view events and remembers the last listings so commands can
/// refer to entries by their position.
pub struct TerminalView {
    palette: Palette,
    conversations: Vec<Conversation>,
    users: Vec<UserSummary>,
    /// Print `HistoryReplaced` instead of only recording it.
    show_history: bool,
}

impl TerminalView {
    pub fn new(theme: Theme) -> Self {
        Self {
            palette: Palette::for_theme(theme),
            conversations: Vec::new(),
            users: Vec::new(),
            show_history: false,
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.palette = Palette::for_theme(theme);
    }

    pub fn show_next_history(&mut self) {
        self.show_history = true;
    }

    /// Withdraws a `show_next_history` the refresh never answered.
    pub fn skip_history(&mut self) {
        self.show_history = false;
    }

    /// Conversation at 1-based `position` of the last listing, or an id typed verbatim.
    pub fn conversation_ref(&self, arg: &str) -> Option<ConversationId> {
        let arg = arg.trim();
        if arg.is_empty() {
            return None;
        }
        if let Some(position) = arg.strip_prefix('#') {
            let index = position.parse::<usize>().ok()?.checked_sub(1)?;
            return self.conversations.get(index).map(|conv| conv.id.clone());
        }
        arg.parse().ok()
    }

    /// User email at 1-based `position` of the last listing, or an email typed verbatim.
    pub fn user_ref(&self, arg: &str) -> Option<String> {
        let arg = arg.trim();
        match arg.parse::<usize>() {
            Ok(position) => position
                .checked_sub(1)
                .and_then(|index| self.users.get(index))
                .map(|user| user.email.clone()),
            Err(_) if !arg.is_empty() => Some(arg.to_string()),
            Err(_) => None,
        }
    }

    pub fn print(&mut self, event: &ViewEvent) {
        match event {
            ViewEvent::EntryAppended { entry, .. } => self.print_entry(entry),
            ViewEvent::EntryUpdated { entry, .. } => self.print_update(entry),
            ViewEvent::Cleared => println!(),
            ViewEvent::WelcomeShown => println!("{}", WELCOME.color(self.palette.assistant)),
            ViewEvent::WelcomeDismissed => {}
            ViewEvent::HistoryReplaced(conversations) => {
                self.conversations = conversations.clone();
                if std::mem::take(&mut self.show_history) {
                    self.print_conversations("Your chats");
                }
            }
            ViewEvent::UsersListed(users) => {
                self.users = users.clone();
                self.print_users();
            }
            ViewEvent::UserConversationsListed {
                email,
                username,
                conversations,
            } => {
                self.conversations = conversations.clone();
                self.print_conversations(&format!("{username} <{email}>"));
            }
            ViewEvent::ConversationOpened { id, title } => {
                let title = title.as_deref().unwrap_or("New chat");
                println!(
                    "{}",
                    format!("=== {title} (#{id}) ===").color(self.palette.header).bold()
                );
            }
            ViewEvent::StateChanged(state) => self.print_state(*state),
            ViewEvent::Notice { level, text } => {
                let line = match level {
                    NoticeLevel::Info => text.color(self.palette.muted),
                    NoticeLevel::Warning => text.yellow(),
                    NoticeLevel::Error => text.red(),
                };
                println!("{line}");
            }
        }
    }

    fn print_entry(&self, entry: &Entry) {
        match entry {
            Entry::Message(MessageEntry { loading: true, .. }) => {
                println!("{}", "...".color(self.palette.muted));
            }
            Entry::Message(message) => self.print_message(message),
            Entry::Action(ActionEntry {
                kind: ActionKind::SuggestTeaching { question },
                ..
            }) => {
                println!(
                    "{}",
                    format!("Type /teach to send \"{question}\" to our team for review.")
                        .color(self.palette.action)
                );
            }
        }
    }

    fn print_update(&self, entry: &Entry) {
        match entry {
            Entry::Message(message) => self.print_message(message),
            Entry::Action(ActionEntry { enabled: false, .. }) => {
                println!("{}", "Question sent for review.".color(self.palette.action));
            }
            Entry::Action(ActionEntry { enabled: true, .. }) => {
                println!("{}", "Could not send the question. Try /teach again.".yellow());
            }
        }
    }

    fn print_message(&self, message: &MessageEntry) {
        let (label, color) = match message.role {
            MessageRole::User => ("you", self.palette.user),
            MessageRole::Assistant => ("zipbum", self.palette.assistant),
        };
        println!("{}", format!("[{label}]").color(color).bold());
        for line in message.content.lines() {
            println!("{}", line.color(color));
        }
    }

    fn print_state(&self, state: SessionState) {
        match state {
            SessionState::Blocked => println!(
                "{}",
                "This chat is closed. Start a new one with /new.".yellow()
            ),
            SessionState::Idle => println!(
                "{}",
                "No active chat. Start one with /new.".color(self.palette.muted)
            ),
            SessionState::Ready | SessionState::Sending => {}
        }
    }

    fn print_conversations(&self, heading: &str) {
        println!("{}", heading.color(self.palette.header).bold());
        for (position, conv) in self.conversations.iter().enumerate() {
            println!(
                "  {} {} {}",
                format!("#{}", position + 1).color(self.palette.muted),
                conv.title,
                format!("(id {})", conv.id).color(self.palette.muted)
            );
        }
    }

    fn print_users(&self) {
        for (position, user) in self.users.iter().enumerate() {
            println!(
                "  {} {} {} {}",
                format!("{}.", position + 1).color(self.palette.muted),
                user.username.bold(),
                format!("<{}>", user.email).color(self.palette.muted),
                format!("{} chats", user.conversation_count).color(self.palette.muted)
            );
        }
    }
}
