//! HTTP-facing error types for the gateway and the reference backend

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::events::ErrorBody;

/// Gateway failure, rendered as `{ "error": ... }`
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Backend answered with a non-success status
    #[error("Backend error: {body}")]
    Backend { status: StatusCode, body: String },

    /// Backend unreachable, timed out, or returned something unparseable.
    /// The detail is for logs only.
    #[error("Failed to connect to backend")]
    Transport(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Backend { status, .. } => *status,
            GatewayError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

/// Reference backend failure
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("OPENAI_API_KEY not configured")]
    MissingApiKey,

    #[error("Empty request body")]
    EmptyBody,

    #[error("Invalid JSON in request body: {0}")]
    InvalidJson(String),

    #[error("Missing 'messages' field in request")]
    MissingMessages,

    #[error("Invalid 'messages' field in request: {0}")]
    InvalidMessages(String),

    #[error("Error calling OpenAI API: {0}")]
    Upstream(String),
}

impl BackendError {
    pub fn status(&self) -> StatusCode {
        match self {
            BackendError::MissingApiKey | BackendError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            BackendError::EmptyBody
            | BackendError::InvalidJson(_)
            | BackendError::MissingMessages
            | BackendError::InvalidMessages(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
