//! Chat and admin read-eval-print loops.

use std::future::Future;

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tokio::sync::mpsc::UnboundedReceiver;
use zipbum_application::{
    AdminCommand, AdminConsole, ChatCommand, IgnoreReason, SendOutcome, SessionController,
};
use zipbum_core::preference::PreferenceStore;
use zipbum_core::session::SessionState;
use zipbum_core::view::ViewEvent;

use crate::helper::{CliHelper, CommandSpec, help_text};
use crate::view::TerminalView;

const CHAT_COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("/new", "", "start a new chat"),
    CommandSpec::new("/history", "", "list your chats"),
    CommandSpec::new("/open", "<#n|id>", "open a chat from the list"),
    CommandSpec::new("/teach", "", "send the unanswered question for review"),
    CommandSpec::new("/logout", "", "end the backend session and exit"),
    CommandSpec::new("/theme", "", "toggle light/dark colors"),
    CommandSpec::new("/help", "", "show this list"),
    CommandSpec::new("/quit", "", "exit"),
];
const CHAT_FOOTER: &str = "Anything else is sent as a message.";

const ADMIN_COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("/users", "", "list users"),
    CommandSpec::new("/user", "<n|email>", "show a user's chats"),
    CommandSpec::new("/back", "", "return to the user list"),
    CommandSpec::new("/open", "<#n|id>", "open a chat"),
    CommandSpec::new("/search", "<term>", "filter users by name or email"),
    CommandSpec::new("/teach", "<question> | <answer>", "add to the knowledge base"),
    CommandSpec::new("/promote", "<user-id>", "grant admin rights"),
    CommandSpec::new("/reload", "", "fetch all conversations again"),
    CommandSpec::new("/theme", "", "toggle light/dark colors"),
    CommandSpec::new("/help", "", "show this list"),
    CommandSpec::new("/quit", "", "exit"),
];
const ADMIN_FOOTER: &str = "Anything else is sent into the open chat as the assistant.";

/// One parsed line of chat input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatLine {
    Empty,
    Send(String),
    New,
    History,
    Open(String),
    Teach,
    Logout,
    Theme,
    Help,
    Quit,
    Unknown(String),
}

/// One parsed line of admin input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AdminLine {
    Empty,
    Send(String),
    Users,
    User(String),
    Back,
    Open(String),
    Search(String),
    Teach { question: String, answer: String },
    Promote(String),
    Reload,
    Theme,
    Help,
    Quit,
    Unknown(String),
}

/// Splits `/command argument` lines; `None` for plain text.
fn split_command(line: &str) -> Option<(&str, &str)> {
    if !line.starts_with('/') {
        return None;
    }
    Some(match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    })
}

fn parse_chat(line: &str) -> ChatLine {
    let line = line.trim();
    if line.is_empty() {
        return ChatLine::Empty;
    }
    let Some((command, arg)) = split_command(line) else {
        return ChatLine::Send(line.to_string());
    };
    match command {
        "/new" => ChatLine::New,
        "/history" => ChatLine::History,
        "/open" => ChatLine::Open(arg.to_string()),
        "/teach" => ChatLine::Teach,
        "/logout" => ChatLine::Logout,
        "/theme" => ChatLine::Theme,
        "/help" => ChatLine::Help,
        "/quit" | "/exit" => ChatLine::Quit,
        other => ChatLine::Unknown(other.to_string()),
    }
}

fn parse_admin(line: &str) -> AdminLine {
    let line = line.trim();
    if line.is_empty() {
        return AdminLine::Empty;
    }
    let Some((command, arg)) = split_command(line) else {
        return AdminLine::Send(line.to_string());
    };
    match command {
        "/users" => AdminLine::Users,
        "/user" => AdminLine::User(arg.to_string()),
        "/back" => AdminLine::Back,
        "/open" => AdminLine::Open(arg.to_string()),
        "/search" => AdminLine::Search(arg.to_string()),
        "/teach" => {
            let (question, answer) = arg.split_once('|').unwrap_or((arg, ""));
            AdminLine::Teach {
                question: question.trim().to_string(),
                answer: answer.trim().to_string(),
            }
        }
        "/promote" => AdminLine::Promote(arg.to_string()),
        "/reload" => AdminLine::Reload,
        "/theme" => AdminLine::Theme,
        "/help" => AdminLine::Help,
        "/quit" | "/exit" => AdminLine::Quit,
        other => AdminLine::Unknown(other.to_string()),
    }
}

/// Runs `task` to completion while printing the events it publishes.
async fn drive<T>(
    task: impl Future<Output = T>,
    events: &mut UnboundedReceiver<ViewEvent>,
    view: &mut TerminalView,
) -> T {
    let mut task = std::pin::pin!(task);
    loop {
        tokio::select! {
            output = &mut task => {
                while let Ok(event) = events.try_recv() {
                    view.print(&event);
                }
                return output;
            }
            Some(event) = events.recv() => view.print(&event),
        }
    }
}

fn editor(commands: &'static [CommandSpec]) -> Result<Editor<CliHelper, DefaultHistory>> {
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new(commands)));
    Ok(rl)
}

/// Reads one line; `None` ends the loop.
fn read_line(rl: &mut Editor<CliHelper, DefaultHistory>, prompt: &str) -> Option<String> {
    match rl.readline(prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                let _ = rl.add_history_entry(line.as_str());
            }
            Some(line)
        }
        Err(ReadlineError::Interrupted) => {
            println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            Some(String::new())
        }
        Err(ReadlineError::Eof) => None,
        Err(err) => {
            eprintln!("{}", format!("Error: {err:?}").red());
            None
        }
    }
}

fn toggle_theme(preferences: &dyn PreferenceStore, view: &mut TerminalView) {
    let theme = preferences.theme().unwrap_or_default().toggle();
    if let Err(err) = preferences.set_theme(theme) {
        tracing::warn!(error = %err, "Theme preference not saved");
    }
    view.set_theme(theme);
    println!("{}", format!("Theme: {theme}").bright_black());
}

fn chat_prompt(state: SessionState) -> &'static str {
    match state {
        SessionState::Ready | SessionState::Sending => "you> ",
        SessionState::Blocked => "(closed)> ",
        SessionState::Idle => "(no chat)> ",
    }
}

fn ignore_message(reason: IgnoreReason) -> Option<&'static str> {
    match reason {
        IgnoreReason::EmptyInput => None,
        IgnoreReason::AlreadySending => Some("Still waiting for the previous answer."),
        IgnoreReason::NoActiveConversation => Some("No active chat. Start one with /new."),
        IgnoreReason::Blocked => Some("This chat is closed. Start a new one with /new."),
    }
}

pub async fn run_chat(
    mut controller: SessionController,
    mut events: UnboundedReceiver<ViewEvent>,
    mut view: TerminalView,
    preferences: &dyn PreferenceStore,
) -> Result<()> {
    let mut rl = editor(CHAT_COMMANDS)?;

    println!("{}", "=== ZIPBUM chat ===".bright_magenta().bold());
    println!("{}", "Type /help for commands.".bright_black());

    drive(controller.bootstrap(), &mut events, &mut view).await;

    while let Some(line) = read_line(&mut rl, chat_prompt(controller.state())) {
        let command = match parse_chat(&line) {
            ChatLine::Empty => continue,
            ChatLine::Quit => break,
            ChatLine::Help => {
                println!("{}", help_text(CHAT_COMMANDS, CHAT_FOOTER).bright_black());
                continue;
            }
            ChatLine::Theme => {
                toggle_theme(preferences, &mut view);
                continue;
            }
            ChatLine::Unknown(command) => {
                println!("{}", format!("Unknown command: {command}").yellow());
                continue;
            }
            ChatLine::Logout => {
                match drive(controller.logout(), &mut events, &mut view).await {
                    Ok(()) => break,
                    Err(err) => {
                        tracing::warn!(error = %err, "Logout failed");
                        continue;
                    }
                }
            }
            ChatLine::Send(text) => {
                let outcome = drive(controller.send(&text), &mut events, &mut view).await;
                if let Some(message) = match outcome {
                    SendOutcome::Ignored(reason) => ignore_message(reason),
                    _ => None,
                } {
                    println!("{}", message.yellow());
                }
                continue;
            }
            ChatLine::New => ChatCommand::NewConversation,
            ChatLine::History => {
                view.show_next_history();
                let refresh = controller.handle(ChatCommand::RefreshHistory);
                drive(refresh, &mut events, &mut view).await;
                // A failed refresh publishes nothing; don't print a later one.
                view.skip_history();
                continue;
            }
            ChatLine::Open(arg) => match view.conversation_ref(&arg) {
                Some(id) => ChatCommand::SelectConversation(id),
                None => {
                    println!("{}", "Usage: /open <#n|id>".yellow());
                    continue;
                }
            },
            ChatLine::Teach => match controller.pending_teaching_action() {
                Some(action) => ChatCommand::RequestTeaching(action),
                None => {
                    println!("{}", "There is no question to send for review.".yellow());
                    continue;
                }
            },
        };
        drive(controller.handle(command), &mut events, &mut view).await;
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

pub async fn run_admin(
    mut console: AdminConsole,
    mut events: UnboundedReceiver<ViewEvent>,
    mut view: TerminalView,
    preferences: &dyn PreferenceStore,
) -> Result<()> {
    let mut rl = editor(ADMIN_COMMANDS)?;

    println!("{}", "=== ZIPBUM admin ===".bright_magenta().bold());
    println!("{}", "Type /help for commands.".bright_black());

    drive(console.handle(AdminCommand::Reload), &mut events, &mut view).await;

    while let Some(line) = read_line(&mut rl, "admin> ") {
        let command = match parse_admin(&line) {
            AdminLine::Empty => continue,
            AdminLine::Quit => break,
            AdminLine::Help => {
                println!("{}", help_text(ADMIN_COMMANDS, ADMIN_FOOTER).bright_black());
                continue;
            }
            AdminLine::Theme => {
                toggle_theme(preferences, &mut view);
                continue;
            }
            AdminLine::Unknown(command) => {
                println!("{}", format!("Unknown command: {command}").yellow());
                continue;
            }
            AdminLine::Send(text) => AdminCommand::Send(text),
            AdminLine::Users => AdminCommand::Search(String::new()),
            AdminLine::User(arg) => match view.user_ref(&arg) {
                Some(email) => AdminCommand::SelectUser(email),
                None => {
                    println!("{}", "Usage: /user <n|email>".yellow());
                    continue;
                }
            },
            AdminLine::Back => AdminCommand::Back,
            AdminLine::Open(arg) => match view.conversation_ref(&arg) {
                Some(id) => AdminCommand::SelectConversation(id),
                None => {
                    println!("{}", "Usage: /open <#n|id>".yellow());
                    continue;
                }
            },
            AdminLine::Search(term) => AdminCommand::Search(term),
            AdminLine::Teach { question, answer } => AdminCommand::Teach { question, answer },
            AdminLine::Promote(arg) => match arg.parse() {
                Ok(user_id) => AdminCommand::Promote(user_id),
                Err(_) => {
                    println!("{}", "Usage: /promote <user-id>".yellow());
                    continue;
                }
            },
            AdminLine::Reload => AdminCommand::Reload,
        };
        drive(console.handle(command), &mut events, &mut view).await;
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}
