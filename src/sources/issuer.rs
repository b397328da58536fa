use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error};

use crate::cache::token::IssuedToken;
use crate::config::settings::{CredentialsConfig, GatewayConfig};
use crate::error::UpstreamAuthError;
use crate::parser::token_response::parse_token_response;
use crate::utils::constants::GRANT_TYPE_CLIENT_CREDENTIALS;

/// Something that can mint a fresh access token.
pub trait TokenIssuer: Send + Sync {
    fn issue_token(
        &self,
    ) -> impl std::future::Future<Output = Result<IssuedToken, UpstreamAuthError>> + Send;
}

/// Client-credentials grant against the gateway identity endpoint.
#[derive(Debug, Clone)]
pub struct HttpTokenIssuer {
    client: Client,
    auth_url: String,
    credentials: CredentialsConfig,
    timeout: Option<Duration>,
}

impl HttpTokenIssuer {
    pub fn new(client: Client, auth_url: String, credentials: CredentialsConfig) -> Self {
        Self { client, auth_url, credentials, timeout: None }
    }

    pub fn from_config(client: Client, gateway: &GatewayConfig) -> Self {
        let mut issuer = Self::new(client, gateway.auth_url.clone(), gateway.credentials.clone());
        issuer.timeout = gateway.token_timeout_ms.map(Duration::from_millis);
        issuer
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn form(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("client_id", self.credentials.client_id.as_str()),
            ("client_version", self.credentials.client_version.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS),
        ]
    }
}

impl TokenIssuer for HttpTokenIssuer {
    async fn issue_token(&self) -> Result<IssuedToken, UpstreamAuthError> {
        debug!(url = %self.auth_url, "requesting access token");

        // `form` sets Content-Type: application/x-www-form-urlencoded
        let mut request = self.client.post(&self.auth_url).form(&self.form());
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.inspect_err(|e| {
            error!("Error fetching access token: {}", e);
        })?;
        let status = response.status();
        let body = response.text().await?;

        parse_token_response(status, &body).inspect_err(|e| {
            error!(payload = %e.payload(), "Error fetching access token: {}", e);
        })
    }
}
