use anyhow::{Context, Result};
use thiserror::Error;

use crate::config::ClientConfig;
use crate::events::{ChatReply, ChatRequest};

/// Why a gateway call did not produce a reply
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to gateway failed: {0}")]
    Transport(String),
    #[error("gateway returned status {0}")]
    Status(u16),
    #[error("malformed gateway response: {0}")]
    Malformed(String),
}

/// HTTP client for the proxy gateway's `/api/chat` endpoint
#[derive(Clone)]
pub struct GatewayClient {
    endpoint: String,
    client: reqwest::Client,
}

impl GatewayClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            endpoint: config.chat_endpoint(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send the full transcript and return the assistant reply.
    /// Single attempt, no retry.
    pub async fn send(&self, request: &ChatRequest) -> Result<String, ClientError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let reply: ChatReply =
            serde_json::from_slice(&body).map_err(|e| ClientError::Malformed(e.to_string()))?;

        Ok(reply.reply)
    }
}
