use crate::config::StoreConfig;
use crate::core::error::{StoreError, StoreResult};
use crate::core::message::{Message, NewMessage};
use crate::storage::MessageStore;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct MessageList {
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct FeedbackUpdate {
    feedback: u8,
}

/// Bearer-authenticated client for the remote message store.
///
/// No retries and no token refresh: every failure goes straight back to the caller.
pub struct StoreClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl StoreClient {
    /// Build a client without contacting the store
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| StoreError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let mut builder = Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Build a client and probe `/api/test`, failing fast if the store is
    /// unreachable or rejects the token
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let client = Self::new(config)?;
        let info = client.test_connection().await?;
        tracing::info!("[StoreClient] Connected to {} ({})", client.base_url, info);
        Ok(client)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` against the base URL. Absolute paths replace any path
    /// component the base URL carries.
    fn endpoint(&self, path: &str) -> StoreResult<Url> {
        self.base_url.join(path).map_err(|e| StoreError::InvalidUrl {
            url: format!("{}{}", self.base_url, path),
            reason: e.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> StoreResult<RequestBuilder> {
        let url = self.endpoint(path)?;
        tracing::debug!("[StoreClient] {} {}", method, url);

        Ok(self
            .client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json"))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<T> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!("[StoreClient] Store returned error status {}: {}", status, body);
            return Err(StoreError::Status { status, body });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("[StoreClient] Failed to decode response body: {}", e);
            StoreError::Decode(e)
        })
    }
}

#[async_trait]
impl MessageStore for StoreClient {
    async fn test_connection(&self) -> StoreResult<Value> {
        self.send(self.request(Method::GET, "/api/test")?).await
    }

    async fn get_messages(&self) -> StoreResult<Vec<Message>> {
        let list: MessageList = self.send(self.request(Method::GET, "/api/messages")?).await?;
        tracing::debug!("[StoreClient] Fetched {} messages", list.messages.len());
        Ok(list.messages)
    }

    async fn post_message(&self, message: NewMessage) -> StoreResult<Value> {
        tracing::info!(
            "[StoreClient] Posting {} message ({} chars)",
            message.role,
            message.content.len()
        );
        let request = self.request(Method::POST, "/api/messages")?.json(&message);
        self.send(request).await
    }

    async fn clear_messages(&self) -> StoreResult<Value> {
        tracing::info!("[StoreClient] Clearing conversation");
        self.send(self.request(Method::DELETE, "/api/messages")?).await
    }

    async fn update_message(&self, index: usize, feedback: u8) -> StoreResult<Value> {
        tracing::info!("[StoreClient] Setting feedback {} on message #{}", feedback, index);
        let request = self
            .request(Method::PUT, &format!("/api/messages/{}", index))?
            .json(&FeedbackUpdate { feedback });
        self.send(request).await
    }
}
