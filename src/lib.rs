//! Wizard Chat - operator console for Wizard-of-Oz chat sessions
//!
//! A human operator answers as the assistant while the conversation itself
//! lives in a remote message store. This library provides the store client,
//! the polling protocol used to wait for the user's turn, and the rendering
//! rules for reasoning, feedback and file attachments.

pub mod cli;
pub mod config;
pub mod core;
pub mod storage;
pub mod utils;
pub mod view;

pub use crate::config::{Settings, StoreConfig};
pub use crate::core::error::{StoreError, StoreResult};
pub use crate::core::message::{Message, NewMessage, Role};
pub use crate::core::store_client::StoreClient;
pub use crate::storage::memory::InMemoryStore;
pub use crate::storage::MessageStore;
pub use crate::view::{ConversationView, PollOutcome, TurnPolicy, ViewState};
