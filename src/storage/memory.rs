//! In-Memory Message Store
//!
//! Information Hiding:
//! - Vec storage structure hidden from users
//! - Thread-safe access via RwLock hidden behind async interface
//! - Echoes every posted field back unchanged, suitable for testing views offline

use super::MessageStore;
use crate::core::error::{StoreError, StoreResult};
use crate::core::message::{Message, NewMessage};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process conversation log.
/// Clones share the same log, so a test can hold one handle and give another to a view.
#[derive(Clone)]
pub struct InMemoryStore {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: Arc::new(RwLock::new(messages)),
        }
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn test_connection(&self) -> StoreResult<Value> {
        Ok(json!({"status": "ok"}))
    }

    async fn get_messages(&self) -> StoreResult<Vec<Message>> {
        let messages = self.messages.read().await;
        tracing::debug!("[InMemoryStore] Listed {} messages", messages.len());
        Ok(messages.clone())
    }

    async fn post_message(&self, message: NewMessage) -> StoreResult<Value> {
        let mut messages = self.messages.write().await;
        messages.push(Message::from(message));
        tracing::debug!("[InMemoryStore] Appended message #{}", messages.len() - 1);
        Ok(json!({"status": "ok", "index": messages.len() - 1}))
    }

    async fn clear_messages(&self) -> StoreResult<Value> {
        let mut messages = self.messages.write().await;
        let removed = messages.len();
        messages.clear();
        tracing::debug!("[InMemoryStore] Cleared {} messages", removed);
        Ok(json!({"status": "ok", "removed": removed}))
    }

    async fn update_message(&self, index: usize, feedback: u8) -> StoreResult<Value> {
        let mut messages = self.messages.write().await;
        let message = messages.get_mut(index).ok_or_else(|| StoreError::Status {
            status: StatusCode::NOT_FOUND,
            body: format!("message {} not found", index),
        })?;
        message.feedback = Some(feedback);
        tracing::debug!("[InMemoryStore] Set feedback {} on message #{}", feedback, index);
        Ok(json!({"status": "ok"}))
    }
}
