//! Proxy gateway: forwards `/api/chat` to the configured backend

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::de::IgnoredAny;
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// Shared, read-only gateway state
pub struct GatewayState {
    /// Fully qualified `<backend>/api/chat` URL, fixed at start-up
    backend_endpoint: String,
    client: reqwest::Client,
}

impl GatewayState {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            backend_endpoint: config.chat_endpoint(),
            client,
        })
    }
}

/// Build the gateway router
pub fn router(config: &GatewayConfig) -> Result<Router> {
    let state = Arc::new(GatewayState::new(config)?);
    Ok(Router::new()
        .route("/api/chat", post(handle_chat))
        .with_state(state))
}

/// Bind and serve until ctrl-c
pub async fn serve(config: GatewayConfig) -> Result<()> {
    let router = router(&config)?;
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind gateway to {}", config.bind))?;
    let addr: SocketAddr = listener.local_addr()?;

    log::info!(
        "[gateway] listening on http://{} forwarding to {}",
        addr,
        config.chat_endpoint()
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Gateway server error")?;

    log::info!("[gateway] stopped");
    Ok(())
}

/// `POST /api/chat`: forward the body unchanged, relay the reply
async fn handle_chat(
    State(state): State<Arc<GatewayState>>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let request_id = Uuid::new_v4();
    let result = forward(&state, body).await;

    match &result {
        Ok(_) => log::info!("[gateway] {} forwarded ok", request_id),
        Err(GatewayError::Backend { status, .. }) => {
            log::warn!("[gateway] {} backend returned {}", request_id, status)
        }
        Err(GatewayError::Transport(detail)) => {
            log::error!("[gateway] {} error proxying to backend: {}", request_id, detail)
        }
    }

    result.map(|reply| ([(header::CONTENT_TYPE, "application/json")], reply).into_response())
}

/// Check that a body is well-formed JSON without building a value from it
fn validate_json(body: &[u8]) -> Result<(), serde_json::Error> {
    serde_json::from_slice::<IgnoredAny>(body).map(|_| ())
}

async fn forward(state: &GatewayState, body: Bytes) -> Result<Bytes, GatewayError> {
    // Any JSON shape is accepted; only unparseable input is rejected.
    // The original bytes go out so key order and number text survive.
    validate_json(&body)
        .map_err(|e| GatewayError::Transport(format!("invalid request body: {}", e)))?;

    let response = state
        .client
        .post(&state.backend_endpoint)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|e| GatewayError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        return Err(GatewayError::Backend {
            status: StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
            body: error_text,
        });
    }

    let reply = response
        .bytes()
        .await
        .map_err(|e| GatewayError::Transport(e.to_string()))?;
    validate_json(&reply)
        .map_err(|e| GatewayError::Transport(format!("invalid backend body: {}", e)))?;

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_any_json_shape() {
        assert!(validate_json(br#"{"b":1,"a":[true,null]}"#).is_ok());
        assert!(validate_json(b"42").is_ok());
        assert!(validate_json(b"{not json").is_err());
        assert!(validate_json(b"").is_err());
    }
}
