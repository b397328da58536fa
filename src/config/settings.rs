use serde::{Deserialize, Deserializer};

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    pub gateway: GatewayConfig,
    pub payment: PaymentConfig,
}

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub logging: Option<LoggingConfig>,
    pub cors: Option<CorsConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: String,
    /// serve `POST /get-auth-token`, which hands the cached credential to callers
    #[serde(default)]
    pub expose_token_endpoint: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { path: default_metrics_path(), is_enabled: false }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

/// ================================
/// Payment gateway
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    /// identity endpoint issuing access tokens
    pub auth_url: String,
    /// checkout API root, e.g. https://api.phonepe.com/apis/pg
    pub base_url: String,
    /// budget for payment, order and refund calls
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// token fetch waits without limit unless set
    pub token_timeout_ms: Option<u64>,
    #[serde(default)]
    pub authorization_scheme: AuthorizationScheme,
    /// subtracted from the issuer-reported lifetime before caching
    #[serde(default)]
    pub safety_margin_seconds: u64,
    pub credentials: CredentialsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CredentialsConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_client_version", deserialize_with = "string_or_number")]
    pub client_version: String,
}

/// How the access token is presented in the `Authorization` header upstream.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationScheme {
    /// `O-Bearer <token>`
    #[default]
    OBearer,
    /// `Bearer <token>`
    Bearer,
    /// `<token>`
    Raw,
}

impl AuthorizationScheme {
    pub fn header_value(&self, token: &str) -> String {
        match self {
            AuthorizationScheme::OBearer => format!("O-Bearer {}", token),
            AuthorizationScheme::Bearer => format!("Bearer {}", token),
            AuthorizationScheme::Raw => token.to_owned(),
        }
    }
}

/// ================================
/// Checkout defaults
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    #[serde(default = "default_expire_after_seconds")]
    pub expire_after_seconds: u64,
    pub merchant_urls: MerchantUrls,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MerchantUrls {
    /// where the gateway sends the shopper back after checkout
    pub redirect_url: String,
    pub success_url: String,
    pub failure_url: String,
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_expire_after_seconds() -> u64 {
    900
}

fn default_client_version() -> String {
    "1".to_string()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(value) => value,
        Raw::Number(value) => value.to_string(),
    })
}
