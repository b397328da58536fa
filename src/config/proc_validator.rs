//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates:
//!   * server address and metrics path
//!   * gateway endpoints, timeouts and credentials
//!   * merchant redirect urls
//!   * CORS origins
//!   * metrics path collisions with relay routes

use http::HeaderValue;
use reqwest::Url;
use tracing::{error, info};

use crate::config::settings::{
    CredentialsConfig, GatewayConfig, PaymentConfig, ServiceConfig, SettingsConfig,
};
use crate::observability::metrics::get_metrics;
use crate::utils::constants::{RELAY_ROUTES, ROUTE_AUTH_TOKEN};

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_gateway(&cfg.gateway, &mut errors);
    validate_payment(&cfg.payment, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc();
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.server.host.trim().is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be an integer in range 0-65535",
            settings.server.port
        ));
    }

    // metrics endpoint start with '/'
    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    } else if metrics.path.contains(['{', '}', '*']) {
        errors.push(format!(
            "settings.metrics.path '{}' must not contain route captures or wildcards",
            metrics.path
        ));
    } else if metrics.is_enabled
        && RELAY_ROUTES
            .iter()
            .filter(|route| settings.server.expose_token_endpoint || **route != ROUTE_AUTH_TOKEN)
            .any(|route| path_collides(&metrics.path, route))
    {
        errors.push(format!(
            "settings.metrics.path '{}' collides with a relay route",
            metrics.path
        ));
    }

    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }

    if let Some(cors) = &settings.cors {
        if cors.allowed_origins.is_empty() {
            errors.push("settings.cors.allowed_origins must list at least one origin".to_string());
        }
        for origin in &cors.allowed_origins {
            if origin != "*" && (Url::parse(origin).is_err() || HeaderValue::from_str(origin).is_err()) {
                errors.push(format!("settings.cors.allowed_origins '{}' is not a valid origin", origin));
            }
        }
    }
}

/// GATEWAY VALIDATION
fn validate_gateway(gateway: &GatewayConfig, errors: &mut Vec<String>) {
    validate_http_url("gateway.auth_url", &gateway.auth_url, errors);
    validate_http_url("gateway.base_url", &gateway.base_url, errors);

    if gateway.timeout_ms == 0 {
        errors.push("gateway.timeout_ms must be greater than 0".to_string());
    }
    if gateway.token_timeout_ms == Some(0) {
        errors.push("gateway.token_timeout_ms must be greater than 0 when set".to_string());
    }
    if gateway.safety_margin_seconds > 60 * 60 * 24 {
        errors.push(format!(
            "gateway.safety_margin_seconds ({}) is unreasonably large",
            gateway.safety_margin_seconds
        ));
    }

    validate_credentials(&gateway.credentials, errors);
}

fn validate_credentials(credentials: &CredentialsConfig, errors: &mut Vec<String>) {
    // empty after env expansion means the variable was not set
    if credentials.client_id.trim().is_empty() {
        errors.push("gateway.credentials.client_id is missing".to_string());
    }
    if credentials.client_secret.trim().is_empty() {
        errors.push("gateway.credentials.client_secret is missing".to_string());
    }
    if credentials.client_version.trim().is_empty() {
        errors.push("gateway.credentials.client_version is missing".to_string());
    }
}

/// PAYMENT VALIDATION
fn validate_payment(payment: &PaymentConfig, errors: &mut Vec<String>) {
    if payment.expire_after_seconds == 0 {
        errors.push("payment.expire_after_seconds must be greater than 0".to_string());
    }
    let urls = &payment.merchant_urls;
    validate_http_url("payment.merchant_urls.redirect_url", &urls.redirect_url, errors);
    validate_http_url("payment.merchant_urls.success_url", &urls.success_url, errors);
    validate_http_url("payment.merchant_urls.failure_url", &urls.failure_url, errors);
}

/// Same route, or nested under it as a path segment.
fn path_collides(path: &str, route: &str) -> bool {
    let path = path.trim_end_matches('/');
    path == route || path.strip_prefix(route).is_some_and(|rest| rest.starts_with('/'))
}

fn validate_http_url(field: &str, value: &str, errors: &mut Vec<String>) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(format!(
            "{} '{}' has unsupported scheme '{}'",
            field, value, url.scheme()
        )),
        Err(e) => errors.push(format!("{} '{}' is not a valid url: {}", field, value, e)),
    }
}
