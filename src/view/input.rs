use crate::core::message::{NewMessage, Role};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Nothing to send")]
    Empty,

    #[error("Malformed message payload: {0}")]
    Malformed(String),

    #[error("Unknown command '/{0}', try /help")]
    UnknownCommand(String),

    #[error("{0}")]
    InvalidArgument(String),
}

/// A reply typed by the operator.
///
/// Either plain text, or a JSON object such as
/// `{"content": "...", "reasoning": "...", "feedback": 1}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocalInput {
    pub content: String,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub feedback: Option<u8>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
}

impl LocalInput {
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InputError::Empty);
        }

        if trimmed.starts_with('{') {
            return serde_json::from_str(trimmed).map_err(|e| InputError::Malformed(e.to_string()));
        }

        Ok(Self::text(trimmed))
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            reasoning: None,
            feedback: None,
            files: None,
        }
    }

    pub fn into_message(self, role: Role) -> NewMessage {
        NewMessage {
            role,
            content: self.content,
            files: self.files,
            reasoning: self.reasoning,
            feedback: self.feedback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Clear the store and seed a fresh conversation
    New,
    /// Re-render from the store
    Refresh,
    /// Set feedback on a message
    Rate { index: usize, value: u8 },
    Settings,
    Help,
    Quit,
}

impl Command {
    /// `None` when `raw` is not a slash command at all
    pub fn parse(raw: &str) -> Option<Result<Self, InputError>> {
        let rest = raw.trim().strip_prefix('/')?;
        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();

        let command = match name {
            "new" => Ok(Command::New),
            "refresh" => Ok(Command::Refresh),
            "settings" => Ok(Command::Settings),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            "rate" => parse_rate(parts.next(), parts.next()),
            other => Err(InputError::UnknownCommand(other.to_string())),
        };
        Some(command)
    }

    pub fn help() -> &'static str {
        "Special commands:\n  \
         /new                  - Clear the conversation and start a new chat\n  \
         /refresh              - Re-render the conversation from the store\n  \
         /rate <index> <value> - Set feedback on a message (thumbs 0-1, stars 0-4)\n  \
         /settings             - Show model settings\n  \
         /help                 - Show this help\n  \
         /quit                 - Exit\n\
         Replies are plain text or JSON: {\"content\": \"...\", \"reasoning\": \"...\"}"
    }
}

fn parse_rate(index: Option<&str>, value: Option<&str>) -> Result<Command, InputError> {
    let usage = || InputError::InvalidArgument("usage: /rate <index> <value>".to_string());
    let index = index.ok_or_else(usage)?.parse::<usize>().map_err(|_| usage())?;
    let value = value.ok_or_else(usage)?.parse::<u8>().map_err(|_| usage())?;
    Ok(Command::Rate { index, value })
}
