use http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::token::{IssuedToken, TokenMetadata};
use crate::error::UpstreamAuthError;

#[derive(Debug, Deserialize)]
struct RawTokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    #[serde(flatten)]
    metadata: TokenMetadata,
}

/// Body as JSON when it parses, otherwise the raw text.
pub fn body_to_value(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_owned()))
}

/// Validate an issuer response and extract the token.
///
/// Nothing is returned unless both `access_token` and `token_type` are
/// non-empty strings.
pub fn parse_token_response(status: StatusCode, body: &str) -> Result<IssuedToken, UpstreamAuthError> {
    let payload = body_to_value(body);

    if !status.is_success() {
        warn!(%status, "token issuer rejected request");
        return Err(UpstreamAuthError::Rejected { status, body: payload });
    }

    let raw: RawTokenResponse = serde_json::from_value(payload.clone()).map_err(|e| {
        UpstreamAuthError::Malformed { reason: format!("unexpected token response shape: {}", e), body: payload.clone() }
    })?;

    let access_token = non_empty(raw.access_token).ok_or_else(|| UpstreamAuthError::Malformed {
        reason: "access_token missing".to_string(),
        body: payload.clone(),
    })?;
    let token_type = non_empty(raw.token_type).ok_or_else(|| UpstreamAuthError::Malformed {
        reason: "token_type missing".to_string(),
        body: payload.clone(),
    })?;

    debug!(expires_in = ?raw.metadata.expires_in, "token response parsed");
    Ok(IssuedToken::new(access_token, token_type, raw.metadata))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
