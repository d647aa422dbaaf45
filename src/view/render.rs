//! Message Rendering
//!
//! Information Hiding:
//! - Sentinel substitution and feedback-scale selection hidden behind `render_message`
//! - Produces plain data; painting to a terminal is someone else's job

use crate::core::message::{
    FeedbackScale, Message, Role, END_MARKER, END_TEXT, START_MARKER, START_TEXT,
};

pub const ASSISTANT_AVATAR: &str = "🦖";
pub const USER_AVATAR: &str = "🧑‍💻";
pub const REASONING_LABEL: &str = "Thoughts";
pub const FILES_LABEL: &str = "Files";

/// Read-only rating widget attached to an assistant bubble
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackControl {
    pub index: usize,
    pub scale: FeedbackScale,
    pub value: Option<u8>,
}

/// One rendered chat message
#[derive(Debug, Clone, PartialEq)]
pub struct ChatBubble {
    pub index: usize,
    pub role: Role,
    pub avatar: &'static str,
    pub reasoning: Option<String>,
    pub files: Vec<String>,
    pub body: String,
    pub feedback: Option<FeedbackControl>,
}

/// Result of rendering a full listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    pub bubbles: Vec<ChatBubble>,
    pub skipped: usize,
}

impl Transcript {
    /// Bubble for the message at store index `index`
    pub fn bubble_at(&self, index: usize) -> Option<&ChatBubble> {
        self.bubbles.iter().find(|b| b.index == index)
    }
}

pub fn avatar(role: &Role) -> Option<&'static str> {
    match role {
        Role::Assistant => Some(ASSISTANT_AVATAR),
        Role::User => Some(USER_AVATAR),
        Role::Other(_) => None,
    }
}

/// Human-readable text for assistant content, substituting sentinel markers
pub fn display_content(content: &str) -> &str {
    match content {
        START_MARKER => START_TEXT,
        END_MARKER => END_TEXT,
        other => other,
    }
}

/// Scale of the rating widget for assistant content; the start marker gets none
pub fn feedback_scale(content: &str) -> Option<FeedbackScale> {
    match content {
        START_MARKER => None,
        END_MARKER => Some(FeedbackScale::Stars),
        _ => Some(FeedbackScale::Thumbs),
    }
}

/// Render one message. Messages with a role outside assistant/user are
/// logged and skipped.
pub fn render_message(index: usize, message: &Message) -> Option<ChatBubble> {
    match &message.role {
        Role::Assistant => Some(ChatBubble {
            index,
            role: Role::Assistant,
            avatar: ASSISTANT_AVATAR,
            reasoning: message.reasoning.clone(),
            files: Vec::new(),
            body: display_content(&message.content).to_string(),
            feedback: feedback_scale(&message.content).map(|scale| FeedbackControl {
                index,
                scale,
                value: message.feedback,
            }),
        }),
        Role::User => Some(ChatBubble {
            index,
            role: Role::User,
            avatar: USER_AVATAR,
            reasoning: None,
            files: message.files.clone().unwrap_or_default(),
            body: message.content.clone(),
            feedback: None,
        }),
        Role::Other(role) => {
            tracing::error!("Unexpected role '{}' at message #{}, skipping", role, index);
            None
        }
    }
}

pub fn render_conversation(messages: &[Message]) -> Transcript {
    let mut transcript = Transcript::default();

    for (index, message) in messages.iter().enumerate() {
        match render_message(index, message) {
            Some(bubble) => transcript.bubbles.push(bubble),
            None => transcript.skipped += 1,
        }
    }

    transcript
}
