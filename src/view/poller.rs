//! Counterparty Polling
//!
//! Information Hiding:
//! - Sleep cadence, backoff growth and deadline arithmetic hidden
//! - Callers describe what a reply looks like and get back a `PollOutcome`

use crate::core::error::StoreResult;
use crate::core::message::{Message, Role};
use crate::storage::MessageStore;
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Idle time after the first miss
    pub interval_ms: u64,
    /// Growth applied to the idle time after every miss; 1.0 keeps it fixed
    pub backoff_factor: f64,
    pub max_interval_ms: u64,
    /// 0 polls until a reply shows up or the poll is cancelled
    pub timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            backoff_factor: 1.0,
            max_interval_ms: 10_000,
            timeout_secs: 600,
        }
    }
}

impl PollConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.interval_ms > 0, "polling.interval_ms must be greater than 0");
        ensure!(
            self.backoff_factor.is_finite() && self.backoff_factor >= 1.0,
            "polling.backoff_factor must be a finite number >= 1.0, got {}",
            self.backoff_factor
        );
        ensure!(
            self.max_interval_ms >= self.interval_ms,
            "polling.max_interval_ms ({}) must not be below polling.interval_ms ({})",
            self.max_interval_ms,
            self.interval_ms
        );
        Ok(())
    }

    pub fn next_interval(&self, current: Duration) -> Duration {
        let ceiling = Duration::from_millis(self.max_interval_ms.max(self.interval_ms));
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_factor.max(1.0))
            .map_or(ceiling, |next| next.min(ceiling))
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The reply and its position in the listing
    Found { index: usize, message: Message },
    TimedOut,
    Cancelled,
}

/// What a counterparty reply looks like in a fresh listing
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyCheck {
    /// The tail message carries this role
    LastRole(Role),
    /// The listing grew past `baseline`, the tail is from `local`'s counterpart
    /// and, by position, it is now `local`'s turn
    Parity { baseline: usize, local: Role },
}

impl ReplyCheck {
    pub fn reply<'a>(&self, messages: &'a [Message]) -> Option<(usize, &'a Message)> {
        let index = messages.len().checked_sub(1)?;
        let last = &messages[index];
        let replied = match self {
            ReplyCheck::LastRole(role) => last.role == *role,
            ReplyCheck::Parity { baseline, local } => {
                messages.len() > *baseline
                    && local.counterpart().as_ref() == Some(&last.role)
                    && next_author_by_position(messages.len()) == *local
            }
        };
        replied.then_some((index, last))
    }
}

/// Author expected at position `len` when the conversation opens with the assistant
pub fn next_author_by_position(len: usize) -> Role {
    if len % 2 == 0 {
        Role::Assistant
    } else {
        Role::User
    }
}

/// Re-fetch the listing until `check` sees a reply, the deadline passes or
/// `cancel` fires. Store errors end the poll immediately.
pub async fn poll_for_reply(
    store: &dyn MessageStore,
    check: &ReplyCheck,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> StoreResult<PollOutcome> {
    let deadline = config.timeout().map(|t| Instant::now() + t);
    let mut interval = config.initial_interval();
    let mut attempts: u32 = 0;

    loop {
        let messages = tokio::select! {
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            result = store.get_messages() => result?,
        };
        attempts += 1;

        if let Some((index, reply)) = check.reply(&messages) {
            tracing::debug!("Reply observed at #{} after {} polls", index, attempts);
            return Ok(PollOutcome::Found {
                index,
                message: reply.clone(),
            });
        }

        let mut idle = interval;
        if let Some(deadline) = deadline {
            let now = Instant::now();
            if now >= deadline {
                tracing::info!("No reply after {} polls, giving up", attempts);
                return Ok(PollOutcome::TimedOut);
            }
            idle = idle.min(deadline - now);
        }

        tokio::select! {
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            _ = sleep(idle) => {}
        }
        interval = config.next_interval(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::NewMessage;
    use crate::storage::memory::InMemoryStore;

    fn fast() -> PollConfig {
        PollConfig {
            interval_ms: 5,
            backoff_factor: 1.0,
            max_interval_ms: 5,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = PollConfig {
            interval_ms: 100,
            backoff_factor: 2.0,
            max_interval_ms: 300,
            timeout_secs: 0,
        };

        let first = config.initial_interval();
        let second = config.next_interval(first);
        let third = config.next_interval(second);

        assert_eq!(second, Duration::from_millis(200));
        assert_eq!(third, Duration::from_millis(300));
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_huge_backoff_saturates_at_ceiling() {
        let config = PollConfig {
            interval_ms: 1,
            backoff_factor: 1e300,
            max_interval_ms: 5,
            timeout_secs: 1,
        };
        let next = config.next_interval(config.initial_interval());
        assert_eq!(next, Duration::from_millis(5));
        assert_eq!(config.next_interval(next), Duration::from_millis(5));
    }

    #[test]
    fn test_validate_rejects_bad_cadence() {
        assert!(PollConfig::default().validate().is_ok());

        let zero_interval = PollConfig {
            interval_ms: 0,
            ..PollConfig::default()
        };
        assert!(zero_interval.validate().is_err());

        for factor in [0.5, f64::NAN, f64::INFINITY] {
            let config = PollConfig {
                backoff_factor: factor,
                ..PollConfig::default()
            };
            assert!(config.validate().is_err(), "factor {} accepted", factor);
        }

        let low_ceiling = PollConfig {
            interval_ms: 500,
            max_interval_ms: 100,
            ..PollConfig::default()
        };
        assert!(low_ceiling.validate().is_err());
    }

    #[tokio::test]
    async fn test_huge_backoff_times_out_cleanly() {
        let store = InMemoryStore::with_messages(vec![NewMessage::start_marker().into()]);
        let config = PollConfig {
            interval_ms: 1,
            backoff_factor: 1e300,
            max_interval_ms: 5,
            timeout_secs: 1,
        };

        let outcome = poll_for_reply(
            &store,
            &ReplyCheck::LastRole(Role::User),
            &config,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::TimedOut);
    }

    #[test]
    fn test_fixed_cadence_by_default() {
        let config = PollConfig::default();
        let first = config.initial_interval();
        assert_eq!(first, Duration::from_secs(1));
        assert_eq!(config.next_interval(first), first);
    }

    #[test]
    fn test_parity_check_needs_growth() {
        let store_messages: Vec<Message> = vec![
            NewMessage::start_marker().into(),
            NewMessage::user("Hi").into(),
        ];
        let check = ReplyCheck::Parity {
            baseline: 1,
            local: Role::Assistant,
        };
        assert!(check.reply(&store_messages).is_some());

        let stale = ReplyCheck::Parity {
            baseline: 2,
            local: Role::Assistant,
        };
        assert!(stale.reply(&store_messages).is_none());
    }

    #[test]
    fn test_parity_check_ignores_foreign_roles() {
        let messages: Vec<Message> = vec![
            NewMessage::start_marker().into(),
            NewMessage::new(Role::from("system"), "note").into(),
        ];
        let check = ReplyCheck::Parity {
            baseline: 1,
            local: Role::Assistant,
        };
        assert!(check.reply(&messages).is_none());
    }

    #[tokio::test]
    async fn test_finds_reply_posted_later() {
        let store = InMemoryStore::with_messages(vec![NewMessage::start_marker().into()]);
        let writer = store.clone();

        tokio::spawn(async move {
            sleep(Duration::from_millis(30)).await;
            writer.post_message(NewMessage::user("Any deals to Rome?")).await.unwrap();
        });

        let outcome = poll_for_reply(
            &store,
            &ReplyCheck::LastRole(Role::User),
            &fast(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        match outcome {
            PollOutcome::Found { index, message } => {
                assert_eq!(index, 1);
                assert_eq!(message.content, "Any deals to Rome?");
            }
            other => panic!("expected a reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_times_out_when_bounded() {
        let store = InMemoryStore::with_messages(vec![NewMessage::start_marker().into()]);
        let config = PollConfig {
            timeout_secs: 1,
            ..fast()
        };

        let outcome = poll_for_reply(
            &store,
            &ReplyCheck::LastRole(Role::User),
            &config,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::TimedOut);
    }

    #[tokio::test]
    async fn test_cancel_stops_polling() {
        let store = InMemoryStore::with_messages(vec![NewMessage::start_marker().into()]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let config = PollConfig {
            timeout_secs: 0,
            ..fast()
        };
        let outcome = poll_for_reply(&store, &ReplyCheck::LastRole(Role::User), &config, &cancel)
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Cancelled);
    }
}
