use std::sync::Arc;
use std::time::Duration;

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use crate::cache::CredentialCache;
use crate::config::settings::{AuthorizationScheme, GatewayConfig, PaymentConfig};
use crate::error::RelayError;
use crate::gateway::models::{
    amount_to_paise, validate_identifier, MerchantUrlsPayload, PaymentFlow, PaymentInitiated,
    PaymentInitiation, PaymentPayload, RefundInitiated, RefundInitiation, RefundPayload,
};
use crate::helpers::time::{get_instant, now_millis};
use crate::observability::metrics::get_metrics;
use crate::parser::token_response::body_to_value;
use crate::sources::{HttpTokenIssuer, TokenIssuer};
use crate::utils::constants::{ORDER_PATH, PAYMENT_FLOW_PG_CHECKOUT, PAY_PATH, REFUND_PATH};

static OP_PAY: &str = "initiate_payment";
static OP_ORDER_STATUS: &str = "order_status";
static OP_REFUND: &str = "refund";
static OP_REFUND_STATUS: &str = "refund_status";
static TRANSPORT_MSG: &str = "transport";
static UPSTREAM_MSG: &str = "upstream";

/// Checkout API client; every call is authorized through the shared credential cache.
#[derive(Debug)]
pub struct GatewayClient<I = HttpTokenIssuer> {
    client: Client,
    credentials: Arc<CredentialCache<I>>,
    base_url: String,
    timeout: Duration,
    scheme: AuthorizationScheme,
    payment: PaymentConfig,
}

impl<I: TokenIssuer> GatewayClient<I> {
    pub fn new(
        client: Client,
        credentials: Arc<CredentialCache<I>>,
        gateway: &GatewayConfig,
        payment: &PaymentConfig,
    ) -> Self {
        Self {
            client,
            credentials,
            base_url: gateway.base_url.trim_end_matches('/').to_owned(),
            timeout: Duration::from_millis(gateway.timeout_ms),
            scheme: gateway.authorization_scheme,
            payment: payment.clone(),
        }
    }

    pub fn credentials(&self) -> &Arc<CredentialCache<I>> {
        &self.credentials
    }

    pub fn payment_config(&self) -> &PaymentConfig {
        &self.payment
    }

    /// Start a PG checkout. A fresh merchant order id is generated per call.
    pub async fn initiate_payment(&self, request: PaymentInitiation) -> Result<PaymentInitiated, RelayError> {
        let amount = request
            .amount
            .ok_or_else(|| RelayError::InvalidRequest("Invalid amount. Please enter a valid amount greater than 0.".to_string()))
            .and_then(amount_to_paise)?;
        let merchant_order_id = Uuid::new_v4().to_string();
        let urls = &self.payment.merchant_urls;

        let payload = PaymentPayload {
            merchant_order_id: merchant_order_id.clone(),
            amount,
            expire_after: self.payment.expire_after_seconds,
            meta_info: request.meta_info,
            payment_flow: PaymentFlow {
                flow_type: PAYMENT_FLOW_PG_CHECKOUT.to_string(),
                message: request.message,
                merchant_urls: MerchantUrlsPayload {
                    redirect_url: request.redirect_url.unwrap_or_else(|| urls.redirect_url.clone()),
                    success_url: Some(urls.success_url.clone()),
                    failure_url: Some(urls.failure_url.clone()),
                },
            },
        };

        info!(merchant_order_id = %merchant_order_id, amount_paise = amount, "initiating payment");
        let url = format!("{}{}", self.base_url, PAY_PATH);
        let data = self.send(OP_PAY, self.client.post(url).json(&payload)).await?;
        Ok(PaymentInitiated { merchant_order_id, data })
    }

    pub async fn order_status(&self, merchant_order_id: &str) -> Result<Value, RelayError> {
        let id = validate_identifier("merchant order id", merchant_order_id)?;
        let url = format!("{}{}/{}/status", self.base_url, ORDER_PATH, id);
        let request = self.client.get(url).header(CONTENT_TYPE, "application/json");
        self.send(OP_ORDER_STATUS, request).await
    }

    /// Refund against an earlier order. Refund id defaults to `RF-<unix millis>`.
    pub async fn refund(&self, request: RefundInitiation) -> Result<RefundInitiated, RelayError> {
        let original_merchant_order_id =
            validate_identifier("merchant order id", &request.merchant_order_id)?.to_owned();
        let amount = amount_to_paise(request.refund_amount)?;
        let merchant_refund_id = match request.merchant_refund_id {
            Some(id) => validate_identifier("merchant refund id", &id)?.to_owned(),
            None => format!("RF-{}", now_millis()),
        };

        let payload = RefundPayload {
            merchant_refund_id: merchant_refund_id.clone(),
            original_merchant_order_id,
            amount,
            reason: request.reason,
        };

        info!(merchant_refund_id = %merchant_refund_id, amount_paise = amount, "initiating refund");
        let url = format!("{}{}", self.base_url, REFUND_PATH);
        let data = self.send(OP_REFUND, self.client.post(url).json(&payload)).await?;
        Ok(RefundInitiated { merchant_refund_id, data })
    }

    pub async fn refund_status(&self, merchant_refund_id: &str) -> Result<Value, RelayError> {
        let id = validate_identifier("merchant refund id", merchant_refund_id)?;
        let url = format!("{}{}/{}/status", self.base_url, REFUND_PATH, id);
        let request = self.client.get(url).header(CONTENT_TYPE, "application/json");
        self.send(OP_REFUND_STATUS, request).await
    }

    /// Attach credentials, send, and relay the upstream JSON verbatim.
    /// POST bodies carry their own JSON content type.
    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Value, RelayError> {
        let token = self.credentials.get_token().await?;
        let metrics = get_metrics().await;
        let start = get_instant();

        let result = request
            .header(AUTHORIZATION, self.scheme.header_value(&token))
            .timeout(self.timeout)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                metrics.upstream_duration.with_label_values(&[operation]).observe(start.elapsed().as_secs_f64());
                metrics.upstream_failures.with_label_values(&[operation, TRANSPORT_MSG]).inc();
                error!(operation, "gateway request failed: {}", e);
                return Err(e.into());
            }
        };

        let status = response.status();
        let body = response.text().await?;
        metrics.upstream_duration.with_label_values(&[operation]).observe(start.elapsed().as_secs_f64());
        metrics.upstream_requests.with_label_values(&[operation, status.as_str()]).inc();

        let body = body_to_value(&body);
        if status.is_success() {
            Ok(body)
        } else {
            metrics.upstream_failures.with_label_values(&[operation, UPSTREAM_MSG]).inc();
            error!(operation, %status, payload = %body, "gateway returned an error");
            Err(RelayError::Upstream { status, body })
        }
    }
}
