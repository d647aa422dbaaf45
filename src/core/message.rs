//! Conversation data model
//!
//! Information Hiding:
//! - Wire representation of roles hidden behind the `Role` enum
//! - Sentinel marker strings and their display text kept in one place
//! - Feedback scale bounds owned here, not by callers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content value that opens a conversation
pub const START_MARKER: &str = "<s>";

/// Content value that closes a conversation
pub const END_MARKER: &str = "</s>";

pub const START_TEXT: &str = "How can I help you today?";

pub const END_TEXT: &str = "Thank you for choosing our service! Your feedback matters, please take a moment to rate your experience.";

/// Author of a message.
///
/// Roles the store may hold but this client does not know about are kept
/// verbatim in `Other` so rendering can report and skip them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Assistant,
    User,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Assistant => "assistant",
            Role::User => "user",
            Role::Other(role) => role,
        }
    }

    /// The role on the other side of the conversation
    pub fn counterpart(&self) -> Option<Role> {
        match self {
            Role::Assistant => Some(Role::User),
            Role::User => Some(Role::Assistant),
            Role::Other(_) => None,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "assistant" => Role::Assistant,
            "user" => Role::User,
            _ => Role::Other(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(role) => role,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message as held by the store.
///
/// `role` and `content` are required; a listing that omits either fails to
/// decode instead of being passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub feedback: Option<u8>,
}

impl Message {
    pub fn is_start_marker(&self) -> bool {
        self.content == START_MARKER
    }

    pub fn is_end_marker(&self) -> bool {
        self.content == END_MARKER
    }
}

/// Body of an append request. Unset optional fields go over the wire as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub role: Role,
    pub content: String,
    pub files: Option<Vec<String>>,
    pub reasoning: Option<String>,
    pub feedback: Option<u8>,
}

impl NewMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            files: None,
            reasoning: None,
            feedback: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Assistant message that seeds a fresh conversation
    pub fn start_marker() -> Self {
        Self::assistant(START_MARKER)
    }

    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn with_feedback(mut self, feedback: u8) -> Self {
        self.feedback = Some(feedback);
        self
    }
}

impl From<NewMessage> for Message {
    fn from(msg: NewMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content,
            files: msg.files,
            reasoning: msg.reasoning,
            feedback: msg.feedback,
        }
    }
}

/// Rating widget attached to assistant messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackScale {
    /// 0 = thumbs down, 1 = thumbs up
    Thumbs,
    /// 0..=4, one to five stars
    Stars,
}

impl FeedbackScale {
    pub fn max(self) -> u8 {
        match self {
            FeedbackScale::Thumbs => 1,
            FeedbackScale::Stars => 4,
        }
    }

    pub fn accepts(self, value: u8) -> bool {
        value <= self.max()
    }
}

impl fmt::Display for FeedbackScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackScale::Thumbs => f.write_str("thumbs"),
            FeedbackScale::Stars => f.write_str("stars"),
        }
    }
}
