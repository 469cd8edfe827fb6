//! Classification of shell input lines.
//!
//! A line starting with `:` is a command; anything else is text appended to
//! the document. `::` escapes a literal leading colon. Parsing is pure; the
//! shell decides what each variant does.

use core_actions::{Choice, Intent};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Intent(Intent),
    /// `:open <path>` skips the chooser.
    OpenPath(PathBuf),
    /// `:saveas <path>` skips the chooser.
    SaveTo(PathBuf),
    Print,
    DeleteLine,
    Help,
    Text(String),
    Unknown(String),
}

pub struct CommandParser;

impl CommandParser {
    pub fn parse(raw: &str) -> ShellCommand {
        let Some(body) = raw.strip_prefix(':') else {
            return ShellCommand::Text(raw.to_string());
        };
        if body.starts_with(':') {
            return ShellCommand::Text(body.to_string());
        }
        let body = body.trim();
        let (name, arg) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (body, ""),
        };
        match (name, arg.is_empty()) {
            ("new" | "n", true) => ShellCommand::Intent(Intent::New),
            ("open" | "o" | "e", true) => ShellCommand::Intent(Intent::Open),
            ("open" | "o" | "e", false) => ShellCommand::OpenPath(PathBuf::from(arg)),
            ("w" | "save", true) => ShellCommand::Intent(Intent::Save),
            ("saveas" | "sa", true) => ShellCommand::Intent(Intent::SaveAs),
            ("saveas" | "sa", false) => ShellCommand::SaveTo(PathBuf::from(arg)),
            ("q" | "quit" | "close", true) => ShellCommand::Intent(Intent::RequestClose),
            ("p" | "print", true) => ShellCommand::Print,
            ("d" | "delete", true) => ShellCommand::DeleteLine,
            ("h" | "help", true) => ShellCommand::Help,
            _ => ShellCommand::Unknown(body.to_string()),
        }
    }
}

/// Answer to the unsaved-changes prompt. An empty line picks `default`;
/// `None` means the reply was not understood and the prompt stays up.
pub fn parse_choice(raw: &str, default: Choice) -> Option<Choice> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "s" | "save" | "y" | "yes" => Some(Choice::Save),
        "d" | "discard" | "n" | "no" => Some(Choice::Discard),
        "c" | "cancel" => Some(Choice::Cancel),
        _ => None,
    }
}

/// Reply to a file chooser. An empty line cancels it.
pub fn parse_selection(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let path = PathBuf::from(trimmed);
    Some(std::path::absolute(&path).unwrap_or(path))
}
