//! Conversation View State Machine
//!
//! Information Hiding:
//! - Turn inference (by last role or by list parity) hidden behind `TurnPolicy`
//! - State transitions only happen inside the view's operations
//! - The listing is re-fetched every cycle; nothing is trusted across cycles

use crate::config::Settings;
use crate::core::error::StoreError;
use crate::core::message::{Message, Role, START_MARKER};
use crate::storage::MessageStore;
use crate::view::input::{InputError, LocalInput};
use crate::view::poller::{
    next_author_by_position, poll_for_reply, PollConfig, PollOutcome, ReplyCheck,
};
use crate::view::render::{
    render_conversation, render_message, ChatBubble, FeedbackControl, Transcript,
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// How the view decides whose turn it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TurnPolicy {
    /// The counterparty is up when the last message is ours
    LastRole,
    /// The counterparty is up when the message count says so, assuming the
    /// conversation opens with an assistant message and strictly alternates
    Parity,
}

impl TurnPolicy {
    pub fn awaiting_counterparty(self, messages: &[Message], local: &Role) -> bool {
        match self {
            TurnPolicy::LastRole => messages.last().is_some_and(|m| m.role == *local),
            TurnPolicy::Parity => {
                !messages.is_empty() && next_author_by_position(messages.len()) != *local
            }
        }
    }

    fn reply_check(self, seen: usize, local: &Role, counterparty: &Role) -> ReplyCheck {
        match self {
            TurnPolicy::LastRole => ReplyCheck::LastRole(counterparty.clone()),
            TurnPolicy::Parity => ReplyCheck::Parity {
                baseline: seen,
                local: local.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Fetch and draw the whole conversation
    Render,
    /// Waiting for the other side to write
    AwaitingCounterparty,
    /// The operator may reply
    AwaitingLocalInput,
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Cannot {action} while the view is {state:?}")]
    WrongState {
        action: &'static str,
        state: ViewState,
    },

    #[error("Role '{0}' cannot take turns in a conversation")]
    UnsupportedRole(Role),

    #[error("Message #{0} does not take feedback")]
    NotRateable(usize),

    #[error("Feedback {value} is out of range for {scale} (0-{max})")]
    FeedbackOutOfRange {
        value: u8,
        scale: crate::core::message::FeedbackScale,
        max: u8,
    },
}

pub struct ConversationView {
    store: Arc<dyn MessageStore>,
    local_role: Role,
    counterparty: Role,
    policy: TurnPolicy,
    poll: PollConfig,
    state: ViewState,
    /// Store index the next message will land at, as of the last fetch
    next_index: usize,
    transcript: Transcript,
}

impl ConversationView {
    pub fn new(
        store: Arc<dyn MessageStore>,
        local_role: Role,
        policy: TurnPolicy,
        poll: PollConfig,
    ) -> Result<Self, ViewError> {
        let counterparty = local_role
            .counterpart()
            .ok_or_else(|| ViewError::UnsupportedRole(local_role.clone()))?;

        Ok(Self {
            store,
            local_role,
            counterparty,
            policy,
            poll,
            state: ViewState::Render,
            next_index: 0,
            transcript: Transcript::default(),
        })
    }

    pub fn from_settings(
        store: Arc<dyn MessageStore>,
        settings: &Settings,
    ) -> Result<Self, ViewError> {
        Self::new(
            store,
            Role::from(settings.view.local_role.as_str()),
            settings.view.turn_policy,
            settings.polling.clone(),
        )
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn policy(&self) -> TurnPolicy {
        self.policy
    }

    pub fn local_role(&self) -> &Role {
        &self.local_role
    }

    pub fn counterparty(&self) -> &Role {
        &self.counterparty
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Whether the operator gets an input box right now
    pub fn input_enabled(&self) -> bool {
        self.state == ViewState::AwaitingLocalInput
    }

    /// Fetch the listing, draw every message and decide whose turn it is
    pub async fn render(&mut self) -> Result<&Transcript, ViewError> {
        let messages = self.store.get_messages().await?;
        self.transcript = render_conversation(&messages);

        self.state = if self.policy.awaiting_counterparty(&messages, &self.local_role) {
            ViewState::AwaitingCounterparty
        } else {
            ViewState::AwaitingLocalInput
        };
        tracing::debug!(
            "Rendered {} messages ({} skipped), next state {:?}",
            messages.len(),
            self.transcript.skipped,
            self.state
        );

        self.next_index = messages.len();
        Ok(&self.transcript)
    }

    /// Poll until the counterparty writes. A reply is drawn and hands the turn
    /// to the operator; a timeout or cancellation sends the view back to Render.
    pub async fn await_counterparty(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, ViewError> {
        if self.state != ViewState::AwaitingCounterparty {
            return Err(ViewError::WrongState {
                action: "wait for a reply",
                state: self.state,
            });
        }

        let check = self
            .policy
            .reply_check(self.next_index, &self.local_role, &self.counterparty);
        let outcome = match poll_for_reply(&*self.store, &check, &self.poll, cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = ViewState::Render;
                return Err(e.into());
            }
        };

        match &outcome {
            PollOutcome::Found { index, message } => {
                if let Some(bubble) = render_message(*index, message) {
                    self.transcript.bubbles.push(bubble);
                }
                self.next_index = index + 1;
                self.state = ViewState::AwaitingLocalInput;
            }
            PollOutcome::TimedOut | PollOutcome::Cancelled => {
                self.state = ViewState::Render;
            }
        }

        Ok(outcome)
    }

    /// Parse the operator's reply, draw it and forward it to the store.
    /// A malformed reply leaves the view where it was and posts nothing.
    pub async fn submit(&mut self, raw: &str) -> Result<ChatBubble, ViewError> {
        if !self.input_enabled() {
            return Err(ViewError::WrongState {
                action: "send a reply",
                state: self.state,
            });
        }

        let input = LocalInput::parse(raw)?;
        let message = input.into_message(self.local_role.clone());
        if message.content == START_MARKER {
            tracing::error!("Unexpected content: the start marker is not a reply");
        }

        let index = self.next_index;
        let bubble = render_message(index, &Message::from(message.clone()))
            .ok_or_else(|| ViewError::UnsupportedRole(self.local_role.clone()))?;
        if let Some(value) = message.feedback {
            check_feedback(index, bubble.feedback.as_ref(), value)?;
        }

        tracing::info!("Sending message to the store: {:?}", message.content);
        self.store.post_message(message).await?;

        self.transcript.bubbles.push(bubble.clone());
        self.state = ViewState::Render;
        Ok(bubble)
    }

    /// Clear the conversation and seed the assistant start marker
    pub async fn new_chat(&mut self) -> Result<(), ViewError> {
        self.store.reset().await?;
        self.next_index = 0;
        self.transcript = Transcript::default();
        self.state = ViewState::Render;
        tracing::info!("Started a new chat");
        Ok(())
    }

    /// Set feedback on the message at `index`. When that message was drawn in
    /// this cycle the value is checked against its control's scale first.
    pub async fn rate(&mut self, index: usize, value: u8) -> Result<(), ViewError> {
        if let Some(bubble) = self.transcript.bubble_at(index) {
            check_feedback(index, bubble.feedback.as_ref(), value)?;
        }

        self.store.update_message(index, value).await?;

        if let Some(control) = self
            .transcript
            .bubbles
            .iter_mut()
            .find(|b| b.index == index)
            .and_then(|b| b.feedback.as_mut())
        {
            control.value = Some(value);
        }
        Ok(())
    }
}

/// `value` must fit the scale of the control drawn for message `index`
fn check_feedback(
    index: usize,
    control: Option<&FeedbackControl>,
    value: u8,
) -> Result<(), ViewError> {
    let control = control.ok_or(ViewError::NotRateable(index))?;
    if !control.scale.accepts(value) {
        return Err(ViewError::FeedbackOutOfRange {
            value,
            scale: control.scale,
            max: control.scale.max(),
        });
    }
    Ok(())
}
