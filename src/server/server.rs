use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use http::{header, HeaderValue, Method};
use reqwest::Client;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

use crate::cache::CredentialCache;
use crate::config::settings::{CorsConfig, ServiceConfig};
use crate::gateway::GatewayClient;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::routes;
use crate::sources::HttpTokenIssuer;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub gateway: Arc<GatewayClient>,
}

impl AppState {
    pub fn new(metrics: &Metrics, gateway: Arc<GatewayClient>) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            gateway,
        }
    }
}

/// Wire the issuer, credential cache and gateway client from config.
pub fn build_gateway(service_config: &ServiceConfig, client: Client) -> Arc<GatewayClient> {
    let gateway_config = &service_config.gateway;
    let issuer = HttpTokenIssuer::from_config(client.clone(), gateway_config);
    let credentials = Arc::new(
        CredentialCache::new(issuer).with_safety_margin(gateway_config.safety_margin_seconds),
    );
    Arc::new(GatewayClient::new(client, credentials, gateway_config, &service_config.payment))
}

pub async fn build_app(service_config: &ServiceConfig, gateway: Arc<GatewayClient>) -> Router {
    let metrics = get_metrics().await;
    let state = AppState::new(metrics, gateway);
    let settings = &service_config.settings;

    let mut app = Router::new()
        .merge(routes::router(settings.server.expose_token_endpoint))
        .merge(state.metrics_state.router(&settings.metrics))
        .with_state(state);

    if let Some(cors) = &settings.cors {
        app = app.layer(cors_layer(cors));
    }
    app
}

pub fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origin = if cors.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            cors.allowed_origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(600))
}

/// Bind and serve until ctrl-c.
pub async fn start(service_config: Arc<ServiceConfig>, client: Client) -> Result<()> {
    let gateway = build_gateway(&service_config, client);
    let app = build_app(&service_config, gateway).await;

    let server = &service_config.settings.server;
    let address = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!("Server is running on http://{}", address);

    let metrics = get_metrics().await;
    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;
    metrics.up.set(0);
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        // no signal handler, run until killed
        Err(_) => std::future::pending::<()>().await,
    }
}
