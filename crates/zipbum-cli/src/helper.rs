use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hint, Hinter};
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

/// One slash command: its name, argument syntax and help line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    /// Empty for commands without an argument.
    pub args: &'static str,
    pub about: &'static str,
}

impl CommandSpec {
    pub const fn new(name: &'static str, args: &'static str, about: &'static str) -> Self {
        Self { name, args, about }
    }

    fn usage(&self) -> String {
        if self.args.is_empty() {
            self.name.to_string()
        } else {
            format!("{} {}", self.name, self.args)
        }
    }
}

/// `/help` output: one aligned line per command, then `footer`.
pub fn help_text(commands: &[CommandSpec], footer: &str) -> String {
    let width = commands
        .iter()
        .map(|cmd| cmd.usage().len())
        .max()
        .unwrap_or_default()
        + 2;
    let mut text = String::new();
    for cmd in commands {
        text.push_str(&format!("{:<width$}{}\n", cmd.usage(), cmd.about));
    }
    text.push_str(footer);
    text
}

/// Command names completing the slash word typed so far.
fn candidates(commands: &[CommandSpec], line: &str) -> Vec<&'static str> {
    if !line.starts_with('/') || line.contains(' ') {
        return Vec::new();
    }
    commands
        .iter()
        .map(|cmd| cmd.name)
        .filter(|name| name.starts_with(line))
        .collect()
}

/// Inline hint shown after the cursor.
///
/// Only the rest of a command name is accepted into the line; argument
/// syntax is display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandHint {
    display: String,
    completion: Option<String>,
}

impl Hint for CommandHint {
    fn display(&self) -> &str {
        &self.display
    }

    fn completion(&self) -> Option<&str> {
        self.completion.as_deref()
    }
}

fn hint_for(commands: &[CommandSpec], line: &str) -> Option<CommandHint> {
    if !line.starts_with('/') {
        return None;
    }
    match line.split_once(' ') {
        None => commands
            .iter()
            .find(|cmd| cmd.name.starts_with(line) && cmd.name.len() > line.len())
            .map(|cmd| {
                let rest = cmd.name[line.len()..].to_string();
                CommandHint {
                    display: rest.clone(),
                    completion: Some(rest),
                }
            }),
        Some((name, "")) => commands
            .iter()
            .find(|cmd| cmd.name == name && !cmd.args.is_empty())
            .map(|cmd| CommandHint {
                display: cmd.args.to_string(),
                completion: None,
            }),
        Some(_) => None,
    }
}

/// Rustyline helper that completes, highlights and hints slash commands.
#[derive(Clone)]
pub struct CliHelper {
    commands: &'static [CommandSpec],
}

impl CliHelper {
    pub fn new(commands: &'static [CommandSpec]) -> Self {
        Self { commands }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let candidates = candidates(self.commands, &line[..pos])
            .into_iter()
            .map(|name| Pair {
                display: name.to_string(),
                replacement: name.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = CommandHint;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<CommandHint> {
        // Only hint at the end of the line.
        if pos < line.len() {
            return None;
        }
        hint_for(self.commands, line)
    }
}

impl Validator for CliHelper {}
