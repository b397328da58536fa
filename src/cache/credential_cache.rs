use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cache::credential::CachedCredential;
use crate::error::UpstreamAuthError;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::sources::TokenIssuer;

static SUCCESS_MSG: &str = "success";
static ERROR_MSG: &str = "error";

/// Expiry-aware cache over a single access token.
///
/// Readers share the `RwLock`. A miss takes the `refresh` mutex and checks
/// again before calling the issuer, so callers arriving during a fetch wait
/// for it and reuse its result instead of issuing their own.
#[derive(Debug)]
pub struct CredentialCache<I> {
    issuer: I,
    credential: RwLock<Option<CachedCredential>>,
    refresh: Mutex<()>,
    safety_margin_seconds: u64,
}

impl<I: TokenIssuer> CredentialCache<I> {
    pub fn new(issuer: I) -> Self {
        Self {
            issuer,
            credential: RwLock::new(None),
            refresh: Mutex::new(()),
            safety_margin_seconds: 0,
        }
    }

    pub fn with_safety_margin(mut self, safety_margin_seconds: u64) -> Self {
        self.safety_margin_seconds = safety_margin_seconds;
        self
    }

    pub fn issuer(&self) -> &I {
        &self.issuer
    }

    /// Return a valid access token, fetching one only when the cache is empty or expired.
    pub async fn get_token(&self) -> Result<String, UpstreamAuthError> {
        self.get_credential().await.map(|credential| credential.token)
    }

    /// Same as [`get_token`](Self::get_token) but returns the whole cached record.
    pub async fn get_credential(&self) -> Result<CachedCredential, UpstreamAuthError> {
        if let Some(credential) = self.valid_credential().await {
            get_metrics().await.token_cache_hits.inc();
            return Ok(credential);
        }

        let _refresh = self.refresh.lock().await;

        // refreshed by another caller while we waited
        if let Some(credential) = self.valid_credential().await {
            get_metrics().await.token_cache_hits.inc();
            return Ok(credential);
        }

        let credential = self.fetch().await?;
        *self.credential.write().await = Some(credential.clone());
        get_metrics().await.token_expiry_unix.set(credential.expires_at_unix());
        info!(
            token_type = %credential.token_type,
            valid_for_secs = credential.remaining().as_secs(),
            "access token refreshed"
        );
        Ok(credential)
    }

    /// Current record, valid or not, without touching the issuer.
    pub async fn snapshot(&self) -> Option<CachedCredential> {
        self.credential.read().await.clone()
    }

    async fn valid_credential(&self) -> Option<CachedCredential> {
        self.credential
            .read()
            .await
            .as_ref()
            .filter(|credential| credential.is_valid())
            .cloned()
    }

    async fn fetch(&self) -> Result<CachedCredential, UpstreamAuthError> {
        let metrics = get_metrics().await;
        let start = get_instant();
        metrics.token_fetch_requests.inc();
        debug!("access token absent or expired, fetching");

        match self.issuer.issue_token().await {
            Ok(issued) => {
                metrics.token_fetch_duration.with_label_values(&[SUCCESS_MSG]).observe(start.elapsed().as_secs_f64());
                Ok(CachedCredential::new(issued, get_instant(), self.safety_margin_seconds))
            }
            Err(e) => {
                metrics.token_fetch_duration.with_label_values(&[ERROR_MSG]).observe(start.elapsed().as_secs_f64());
                metrics.token_fetch_failures.with_label_values(&[failure_reason(&e)]).inc();
                warn!("access token fetch failed: {}", e);
                Err(e)
            }
        }
    }
}

fn failure_reason(err: &UpstreamAuthError) -> &'static str {
    match err {
        UpstreamAuthError::Rejected { .. } => "rejected",
        UpstreamAuthError::Malformed { .. } => "malformed",
        UpstreamAuthError::Transport(_) => "transport",
    }
}
