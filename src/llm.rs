use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::BackendConfig;

/// Message in conversation, as sent to the completions API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: String,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// Request to send to LLM
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub messages: Vec<LlmMessage>,
}

impl LlmRequest {
    pub fn new(messages: Vec<LlmMessage>) -> Self {
        Self { messages }
    }

    /// Prepend the system prompt unless the conversation already opens with one
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        let has_system = self
            .messages
            .first()
            .is_some_and(|message| message.role == "system");
        if !has_system {
            self.messages.insert(0, LlmMessage::system(prompt));
        }
        self
    }
}

/// Non-streaming client for an OpenAI-compatible chat completions API
#[derive(Clone)]
pub struct LlmClient {
    config: BackendConfig,
    client: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    pub fn has_api_key(&self) -> bool {
        self.config.has_api_key()
    }

    /// Request a single completion and return the assistant text
    pub async fn complete(&self, request: LlmRequest) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("No API key configured"))?;

        let payload = serde_json::json!({
            "model": self.config.model,
            "messages": request.messages,
        });

        let response = self
            .client
            .post(self.config.completions_endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("{} {}", status, error_text));
        }

        let body: serde_json::Value = response.json().await?;
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("response has no choices[0].message.content"))
    }
}
