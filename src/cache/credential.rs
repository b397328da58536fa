use std::time::Duration;

use tokio::time::Instant;

use crate::cache::token::{IssuedToken, TokenMetadata};
use crate::helpers::time::now_i64;

/// Access token paired with the instant it stops being served.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedCredential {
    pub token: String,
    pub token_type: String,
    pub expires_at: Instant,
    pub metadata: TokenMetadata,
}

impl CachedCredential {
    /// `fetched_at` is the instant the issuer response arrived.
    pub fn new(
        issued: IssuedToken,
        fetched_at: Instant,
        safety_margin_seconds: u64,
    ) -> Self {
        let lifetime = issued
            .lifetime_seconds(now_i64())
            .saturating_sub(safety_margin_seconds);
        Self {
            token: issued.access_token,
            token_type: issued.token_type,
            // unrepresentable expiry counts as already expired
            expires_at: fetched_at
                .checked_add(Duration::from_secs(lifetime))
                .unwrap_or(fetched_at),
            metadata: issued.metadata,
        }
    }

    /// Valid strictly before `expires_at`.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Instant::now())
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Expiry as wall-clock UNIX seconds.
    pub fn expires_at_unix(&self) -> i64 {
        let remaining = i64::try_from(self.remaining().as_secs()).unwrap_or(i64::MAX);
        now_i64().saturating_add(remaining)
    }
}
