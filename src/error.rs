use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

/// Failure to obtain an access token from the gateway identity endpoint.
///
/// Never retried; the caller decides how to surface it.
#[derive(Error, Debug, Clone)]
pub enum UpstreamAuthError {
    /// Issuer answered with a non-2xx status
    #[error("token issuer rejected the request (status: {status})")]
    Rejected { status: StatusCode, body: Value },

    /// Issuer answered 2xx but the body is not a usable token response
    #[error("token issuer returned a malformed response: {reason}")]
    Malformed { reason: String, body: Value },

    /// Request never produced a response (connect, timeout, body read)
    #[error("token issuer request failed: {0}")]
    Transport(String),
}

impl UpstreamAuthError {
    /// Upstream error body when one was received, the transport message otherwise.
    pub fn payload(&self) -> Value {
        match self {
            UpstreamAuthError::Rejected { body, .. } => body.clone(),
            UpstreamAuthError::Malformed { body, .. } => body.clone(),
            UpstreamAuthError::Transport(message) => Value::String(message.clone()),
        }
    }
}

impl From<reqwest::Error> for UpstreamAuthError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamAuthError::Transport(err.to_string())
    }
}

/// Errors of the gateway relay operations.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("failed to acquire access token: {0}")]
    Auth(#[from] UpstreamAuthError),

    #[error("gateway returned an error (status: {status})")]
    Upstream { status: StatusCode, body: Value },

    #[error("gateway request failed: {0}")]
    Transport(String),

    #[error("{0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Transport(err.to_string())
    }
}

impl RelayError {
    pub fn payload(&self) -> Value {
        match self {
            RelayError::Auth(e) => e.payload(),
            RelayError::Upstream { body, .. } => body.clone(),
            RelayError::Transport(message) => Value::String(message.clone()),
            RelayError::InvalidRequest(message) => Value::String(message.clone()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the `{success: false, ...}` envelope; `message` names the failed operation.
    pub fn into_response_with(self, message: &str) -> Response {
        match self {
            RelayError::InvalidRequest(reason) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "message": reason })),
            )
                .into_response(),
            other => (
                other.status_code(),
                Json(json!({
                    "success": false,
                    "message": message,
                    "error": other.payload(),
                })),
            )
                .into_response(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        self.into_response_with("Gateway request failed")
    }
}
