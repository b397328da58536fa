use serde::{Deserialize, Serialize};

use crate::utils::constants::MAX_TOKEN_LIFETIME_SECONDS;

/// Token as reported by the gateway identity endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(flatten)]
    pub metadata: TokenMetadata,
}

/// Optional fields passed through from the issuer response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TokenMetadata {
    pub expires_in: Option<i64>,
    pub encrypted_access_token: Option<String>,
    pub issued_at: Option<i64>,     // UNIX TIMESTAMP
    pub expires_at: Option<i64>,    // UNIX TIMESTAMP
    pub session_expires_at: Option<i64>,
}

impl IssuedToken {
    pub fn new(access_token: String, token_type: String, metadata: TokenMetadata) -> Self {
        Self { access_token, token_type, metadata }
    }

    /// Lifetime in seconds counted from `now_unix_ts`.
    ///
    /// `expires_in` wins; an absolute `expires_at` is the fallback. Neither
    /// present, or a past expiry, yields zero. Capped at
    /// `MAX_TOKEN_LIFETIME_SECONDS`.
    pub fn lifetime_seconds(&self, now_unix_ts: i64) -> u64 {
        let lifetime = self
            .metadata
            .expires_in
            .or_else(|| self.metadata.expires_at.map(|at| at.saturating_sub(now_unix_ts)))
            .unwrap_or(0);
        u64::try_from(lifetime).unwrap_or(0).min(MAX_TOKEN_LIFETIME_SECONDS)
    }
}
