//! Message Store Abstraction
//!
//! Information Hiding:
//! - Whether the conversation lives behind HTTP or in process memory is hidden behind the trait
//! - The view only sees ordered messages and acknowledgements
//! - Reset sequencing (clear, then seed) lives here once

use crate::core::error::StoreResult;
use crate::core::message::{Message, NewMessage};
use async_trait::async_trait;
use serde_json::Value;

pub mod memory;

/// Append-mostly conversation log owned by somebody else.
/// Indexing for `update_message` is zero-based over the current listing.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Connectivity and credential check
    async fn test_connection(&self) -> StoreResult<Value>;

    /// Full ordered conversation
    async fn get_messages(&self) -> StoreResult<Vec<Message>>;

    /// Append one message, returning the store's acknowledgement
    async fn post_message(&self, message: NewMessage) -> StoreResult<Value>;

    /// Drop every message
    async fn clear_messages(&self) -> StoreResult<Value>;

    /// Set the feedback field of the message at `index`
    async fn update_message(&self, index: usize, feedback: u8) -> StoreResult<Value>;

    /// Start over: clear, then seed the assistant start marker
    async fn reset(&self) -> StoreResult<()> {
        self.clear_messages().await?;
        self.post_message(NewMessage::start_marker()).await?;
        Ok(())
    }
}
