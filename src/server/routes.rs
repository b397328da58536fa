use axum::{
    extract::{Path, State},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{error, info};

use crate::error::RelayError;
use crate::gateway::callback::{self, CallbackOutcome};
use crate::gateway::models::{PaymentInitiation, RefundInitiation};
use crate::observability::metrics::get_metrics;
use crate::server::extractors::NotificationBody;
use crate::server::server::AppState;
use crate::utils::constants::{
    ROUTE_AUTH_TOKEN, ROUTE_INITIATE_PAYMENT, ROUTE_INITIATE_REFUND, ROUTE_ORDER_STATUS,
    ROUTE_PAYMENT_CALLBACK, ROUTE_REFUND_STATUS, ROUTE_WEBHOOK,
};

/// Merchant-facing relay routes.
pub fn router(expose_token_endpoint: bool) -> Router<AppState> {
    let mut router = Router::new()
        .route(ROUTE_INITIATE_PAYMENT, post(initiate_payment))
        .route(&format!("{}/{{order_id}}", ROUTE_ORDER_STATUS), get(order_status))
        .route(ROUTE_INITIATE_REFUND, post(initiate_refund))
        .route(&format!("{}/{{refund_id}}", ROUTE_REFUND_STATUS), get(refund_status))
        .route(ROUTE_PAYMENT_CALLBACK, post(payment_callback))
        .route(ROUTE_WEBHOOK, post(webhook));

    if expose_token_endpoint {
        router = router.route(ROUTE_AUTH_TOKEN, post(auth_token));
    }
    router
}

async fn initiate_payment(
    State(state): State<AppState>,
    Json(request): Json<PaymentInitiation>,
) -> Response {
    match state.gateway.initiate_payment(request).await {
        Ok(initiated) => Json(json!({
            "success": true,
            "merchantOrderId": initiated.merchant_order_id,
            "data": initiated.data,
        }))
        .into_response(),
        Err(e) => {
            log_failure("Error initiating payment", &e);
            e.into_response_with("Payment initiation failed")
        }
    }
}

async fn order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Response {
    match state.gateway.order_status(&order_id).await {
        Ok(data) => Json(json!({ "success": true, "data": data })).into_response(),
        Err(e) => {
            log_failure("Error fetching order status", &e);
            e.into_response_with("Failed to fetch order status")
        }
    }
}

async fn initiate_refund(
    State(state): State<AppState>,
    Json(request): Json<RefundInitiation>,
) -> Response {
    match state.gateway.refund(request).await {
        Ok(refund) => Json(json!({
            "success": true,
            "merchantRefundId": refund.merchant_refund_id,
            "data": refund.data,
        }))
        .into_response(),
        Err(e) => {
            log_failure("Error initiating refund", &e);
            e.into_response_with("Refund initiation failed")
        }
    }
}

async fn refund_status(
    State(state): State<AppState>,
    Path(refund_id): Path<String>,
) -> Response {
    match state.gateway.refund_status(&refund_id).await {
        Ok(data) => Json(json!({ "success": true, "data": data })).into_response(),
        Err(e) => {
            log_failure("Error fetching refund status", &e);
            e.into_response_with("Failed to fetch refund status")
        }
    }
}

/// Browser-facing return leg: redirect to the merchant success or failure page.
async fn payment_callback(
    State(state): State<AppState>,
    NotificationBody(body): NotificationBody,
) -> Response {
    let outcome = callback::outcome(&body);
    let order_id = callback::merchant_order_id(&body).unwrap_or("unknown");
    get_metrics().await.callbacks_received.with_label_values(&[outcome.as_str()]).inc();

    let urls = &state.gateway.payment_config().merchant_urls;
    let location = match outcome {
        CallbackOutcome::Success => {
            info!(merchant_order_id = %order_id, "Payment successful for order");
            urls.success_url.as_str()
        }
        CallbackOutcome::Failure => {
            info!(merchant_order_id = %order_id, state = ?callback::payment_state(&body), "Payment failed for order");
            urls.failure_url.as_str()
        }
    };
    (StatusCode::FOUND, [(LOCATION, location.to_owned())]).into_response()
}

async fn webhook(NotificationBody(body): NotificationBody) -> Response {
    info!(
        merchant_order_id = ?callback::merchant_order_id(&body),
        state = ?callback::payment_state(&body),
        "Webhook received"
    );
    Json(json!({ "success": true, "message": "Webhook received successfully" })).into_response()
}

async fn auth_token(State(state): State<AppState>) -> Response {
    match state.gateway.credentials().get_credential().await {
        Ok(credential) => {
            let metadata = &credential.metadata;
            Json(json!({
                "success": true,
                "data": {
                    "accessToken": credential.token,
                    "tokenType": credential.token_type,
                    "expiresIn": credential.remaining().as_secs(),
                    "encryptedAccessToken": metadata.encrypted_access_token,
                    "issuedAt": metadata.issued_at,
                    "expiresAt": metadata.expires_at,
                    "sessionExpiresAt": metadata.session_expires_at,
                }
            }))
            .into_response()
        }
        Err(e) => {
            error!(payload = %e.payload(), "Error fetching auth token: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.payload() })),
            )
                .into_response()
        }
    }
}

fn log_failure(context: &str, err: &RelayError) {
    error!(payload = %err.payload(), "{}: {}", context, err);
}
