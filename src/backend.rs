//! Reference `/api/chat` backend backed by an OpenAI-compatible API

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::events::ChatReply;
use crate::llm::{LlmClient, LlmMessage, LlmRequest};

pub struct BackendState {
    llm: LlmClient,
    system_prompt: String,
}

/// Build the backend router, CORS included
pub fn router(config: &BackendConfig) -> Result<Router> {
    let state = Arc::new(BackendState {
        llm: LlmClient::new(config.clone())?,
        system_prompt: config.system_prompt.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(Router::new()
        .route("/", get(health))
        .route("/api/chat", post(handle_chat))
        .layer(cors)
        .with_state(state))
}

pub async fn serve(config: BackendConfig) -> Result<()> {
    if !config.has_api_key() {
        log::warn!("[backend] OPENAI_API_KEY is not set, chat requests will fail");
    }

    let router = router(&config)?;
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind backend to {}", config.bind))?;

    log::info!(
        "[backend] listening on http://{} using model {}",
        listener.local_addr()?,
        config.model
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Backend server error")?;

    log::info!("[backend] stopped");
    Ok(())
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn handle_chat(
    State(state): State<Arc<BackendState>>,
    body: Bytes,
) -> Result<Json<ChatReply>, BackendError> {
    if !state.llm.has_api_key() {
        return Err(BackendError::MissingApiKey);
    }

    let messages = parse_messages(&body)?;
    log::debug!("[backend] completing conversation of {} messages", messages.len());

    let request = LlmRequest::new(messages).with_system_prompt(&state.system_prompt);
    let reply = state.llm.complete(request).await.map_err(|e| {
        let err = BackendError::Upstream(e.to_string());
        log::error!("[backend] {}", err);
        err
    })?;

    Ok(Json(ChatReply { reply }))
}

/// Validate the request body and extract its conversation
fn parse_messages(body: &[u8]) -> Result<Vec<LlmMessage>, BackendError> {
    if body.is_empty() {
        return Err(BackendError::EmptyBody);
    }

    let mut request: Value =
        serde_json::from_slice(body).map_err(|e| BackendError::InvalidJson(e.to_string()))?;

    let messages = request
        .get_mut("messages")
        .map(Value::take)
        .ok_or(BackendError::MissingMessages)?;

    serde_json::from_value(messages).map_err(|e| BackendError::InvalidMessages(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_role_content_pairs() {
        let body = br#"{"messages":[{"role":"user","content":"Hello"}]}"#;
        let messages = parse_messages(body).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "Hello");
    }

    #[test]
    fn rejects_empty_body() {
        assert!(matches!(parse_messages(b""), Err(BackendError::EmptyBody)));
    }

    #[test]
    fn rejects_invalid_json() {
        let err = parse_messages(b"{not json").unwrap_err();
        assert!(matches!(err, BackendError::InvalidJson(_)));
        assert!(err.to_string().starts_with("Invalid JSON in request body: "));
    }

    #[test]
    fn rejects_missing_messages() {
        let err = parse_messages(br#"{"history":[]}"#).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'messages' field in request");
    }

    #[test]
    fn rejects_entries_without_content() {
        let err = parse_messages(br#"{"messages":[{"role":"user"}]}"#).unwrap_err();
        assert!(matches!(err, BackendError::InvalidMessages(_)));
    }
}
