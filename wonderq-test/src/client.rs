//! Client for interacting with a WonderQ server

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use wonderq_core::{ErrorCode, MessageId};

/// Decoded body of any queue route
#[derive(Debug, Clone, Deserialize)]
pub struct WireResponse {
    pub error: ErrorCode,
    #[serde(default)]
    pub id: Option<MessageId>,
    #[serde(default)]
    pub message: Option<ReceivedMessage>,
}

/// A leased message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReceivedMessage {
    pub id: MessageId,
    pub body: String,
}

/// Client for the queue routes
pub struct WonderQClient {
    base_url: String,
    client: Client,
}

impl WonderQClient {
    /// Create a new client
    pub fn new(base_url: String) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self { base_url, client })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Enqueue a message and return its id
    pub async fn create_message(&self, body: &str) -> Result<MessageId, ClientError> {
        let response = self
            .create_message_raw(&serde_json::json!({ "message": body }))
            .await?;
        match (response.error, response.id) {
            (ErrorCode::Ok, Some(id)) => Ok(id),
            (ErrorCode::Ok, None) => Err(ClientError::Parse("missing id".to_string())),
            (code, _) => Err(ClientError::Rejected(code)),
        }
    }

    /// POST an arbitrary JSON body to `/create-message`
    pub async fn create_message_raw(&self, body: &Value) -> Result<WireResponse, ClientError> {
        self.post_json("/create-message", body).await
    }

    /// Lease the next message; `None` when nothing is eligible
    pub async fn new_message(&self) -> Result<Option<ReceivedMessage>, ClientError> {
        let url = format!("{}/new-message", self.base_url);
        let response: WireResponse = self.client.get(&url).send().await?.json().await?;

        match response.error {
            ErrorCode::Ok => response
                .message
                .map(Some)
                .ok_or_else(|| ClientError::Parse("missing message".to_string())),
            ErrorCode::Rejected => Ok(None),
            code => Err(ClientError::Rejected(code)),
        }
    }

    /// Send a raw status for `id` and return the resulting code
    pub async fn update_message(&self, id: &str, status: i64) -> Result<ErrorCode, ClientError> {
        let body = serde_json::json!({ "id": id, "status": status });
        Ok(self.post_json("/update-message", &body).await?.error)
    }

    /// Acknowledge a message (status 1)
    pub async fn acknowledge(&self, id: &str) -> Result<(), ClientError> {
        expect_ok(self.update_message(id, 1).await?)
    }

    /// Release a message (status 2)
    pub async fn release(&self, id: &str) -> Result<(), ClientError> {
        expect_ok(self.update_message(id, 2).await?)
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<WireResponse, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await?;
        Ok(response.json().await?)
    }
}

fn expect_ok(code: ErrorCode) -> Result<(), ClientError> {
    if code.is_ok() {
        Ok(())
    } else {
        Err(ClientError::Rejected(code))
    }
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Server answered with {0}")]
    Rejected(ErrorCode),
}
