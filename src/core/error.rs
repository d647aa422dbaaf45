use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the message store. None of them are retried.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid store URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to decode store response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StoreError {
    /// True when the store rejected the bearer token
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            StoreError::Status { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
