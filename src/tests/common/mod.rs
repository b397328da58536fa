// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use reqwest::Client;

use crate::cache::token::{IssuedToken, TokenMetadata};
use crate::config::settings::{
    AuthorizationScheme, CredentialsConfig, GatewayConfig, LogFormat, LoggingConfig, MerchantUrls,
    MetricsConfig, PaymentConfig, ServerConfig, ServiceConfig, SettingsConfig,
};
use crate::error::UpstreamAuthError;
use crate::sources::TokenIssuer;

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

/// Client that reports redirects instead of following them.
pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("reqwest client")
}

pub fn issued(token: &str, expires_in: i64) -> IssuedToken {
    IssuedToken::new(
        token.to_owned(),
        "Bearer".to_owned(),
        TokenMetadata { expires_in: Some(expires_in), ..Default::default() },
    )
}

/// Issuer that replays queued responses and counts calls.
pub struct ScriptedIssuer {
    calls: AtomicUsize,
    responses: Mutex<VecDeque<Result<IssuedToken, UpstreamAuthError>>>,
    delay: Option<Duration>,
}

impl ScriptedIssuer {
    pub fn new(responses: Vec<Result<IssuedToken, UpstreamAuthError>>) -> Self {
        Self { calls: AtomicUsize::new(0), responses: Mutex::new(responses.into()), delay: None }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenIssuer for ScriptedIssuer {
    async fn issue_token(&self) -> Result<IssuedToken, UpstreamAuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(UpstreamAuthError::Transport("no scripted response left".into())))
    }
}

/// Config pointing both the identity endpoint and the checkout API at `gateway_base`.
pub fn test_service_config(gateway_base: &str) -> ServiceConfig {
    ServiceConfig {
        settings: SettingsConfig {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: "0".into(),
                expose_token_endpoint: true,
            },
            metrics: MetricsConfig { path: "/metrics".into(), is_enabled: true },
            logging: Some(LoggingConfig::new("debug".into(), LogFormat::Compact)),
            cors: None,
        },
        gateway: GatewayConfig {
            auth_url: format!("{}/v1/oauth/token", gateway_base),
            base_url: gateway_base.to_owned(),
            timeout_ms: 2_000,
            token_timeout_ms: Some(2_000),
            authorization_scheme: AuthorizationScheme::OBearer,
            safety_margin_seconds: 0,
            credentials: CredentialsConfig {
                client_id: "merchant-client".into(),
                client_secret: "merchant-secret".into(),
                client_version: "1".into(),
            },
        },
        payment: PaymentConfig {
            expire_after_seconds: 900,
            merchant_urls: MerchantUrls {
                redirect_url: "https://shop.example/payment-callback".into(),
                success_url: "https://shop.example/success".into(),
                failure_url: "https://shop.example/failure".into(),
            },
        },
    }
}
