// End-to-end: relay app in front of a fake gateway serving both the identity
// endpoint and the checkout API.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json,
};
use http::{header::LOCATION, StatusCode};
use serde_json::Value;

use crate::config::settings::ServiceConfig;
use crate::server::server::{build_app, build_gateway};
use crate::tests::common::{build_reqwest_client, json, spawn_axum, test_service_config, JoinHandle, Router};

#[derive(Clone, Default)]
struct FakeGateway {
    token_calls: Arc<AtomicUsize>,
    reject_tokens: bool,
    requests: Arc<Mutex<Vec<Captured>>>,
}

#[derive(Clone, Debug)]
struct Captured {
    path: String,
    authorization: Option<String>,
    body: Value,
}

impl FakeGateway {
    fn record(&self, path: String, headers: &HeaderMap, body: Value) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        self.requests.lock().unwrap().push(Captured { path, authorization, body });
    }

    fn captured(&self) -> Vec<Captured> {
        self.requests.lock().unwrap().clone()
    }

    fn router(self) -> Router {
        Router::new()
            .route("/v1/oauth/token", post(issue_token))
            .route("/checkout/v2/pay", post(pay))
            .route("/checkout/v2/order/{id}/status", get(order_status))
            .route("/payments/v2/refund", post(refund))
            .route("/payments/v2/refund/{id}/status", get(refund_status))
            .with_state(self)
    }
}

async fn issue_token(State(gw): State<FakeGateway>) -> Response {
    let n = gw.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
    if gw.reject_tokens {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "code": "INVALID_CLIENT", "message": "Client not found" })),
        )
            .into_response();
    }
    Json(json!({
        "access_token": format!("tok_{}", n),
        "encrypted_access_token": "enc",
        "expires_in": 1200,
        "issued_at": 1_700_000_000,
        "expires_at": 1_700_001_200,
        "session_expires_at": 1_700_001_200,
        "token_type": "O-Bearer"
    }))
    .into_response()
}

async fn pay(State(gw): State<FakeGateway>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let order_id = body["merchantOrderId"].clone();
    gw.record("/checkout/v2/pay".into(), &headers, body);
    Json(json!({
        "orderId": "OMO123",
        "state": "PENDING",
        "redirectUrl": "https://mercury.example/checkout?token=abc",
        "echo": order_id
    }))
    .into_response()
}

async fn order_status(State(gw): State<FakeGateway>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    gw.record(format!("/checkout/v2/order/{}/status", id), &headers, Value::Null);
    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "code": "ORDER_NOT_FOUND", "message": "No order found" })),
        )
            .into_response();
    }
    Json(json!({ "orderId": "OMO123", "state": "COMPLETED", "amount": 10000 })).into_response()
}

async fn refund(State(gw): State<FakeGateway>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    gw.record("/payments/v2/refund".into(), &headers, body);
    Json(json!({ "refundId": "OMR123", "state": "PENDING", "amount": 5000 })).into_response()
}

async fn refund_status(State(gw): State<FakeGateway>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    gw.record(format!("/payments/v2/refund/{}/status", id), &headers, Value::Null);
    Json(json!({ "merchantRefundId": id, "state": "COMPLETED" })).into_response()
}

struct Harness {
    gateway: FakeGateway,
    relay: SocketAddr,
    handles: Vec<JoinHandle<()>>,
}

impl Harness {
    async fn start(gateway: FakeGateway) -> Self {
        Self::start_with(gateway, |_| {}).await
    }

    async fn start_with(gateway: FakeGateway, tweak: impl FnOnce(&mut ServiceConfig)) -> Self {
        let (gateway_handle, gateway_addr) = spawn_axum(gateway.clone().router()).await;
        let mut config = test_service_config(&format!("http://{}", gateway_addr));
        tweak(&mut config);

        let client = build_reqwest_client();
        let app = build_app(&config, build_gateway(&config, client)).await;
        let (relay_handle, relay) = spawn_axum(app).await;

        Self { gateway, relay, handles: vec![gateway_handle, relay_handle] }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.relay, path)
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.handles.iter().for_each(|h| h.abort());
    }
}

#[tokio::test]
async fn payment_initiation_is_authorized_and_relayed() {
    let harness = Harness::start(FakeGateway::default()).await;
    let client = build_reqwest_client();

    let res = client
        .post(harness.url("/initiate-payment"))
        .json(&json!({ "amount": 100.5, "message": "Course fee", "metaInfo": { "udf1": "student-42" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["orderId"], "OMO123");
    let order_id = body["merchantOrderId"].as_str().unwrap().to_owned();
    assert_eq!(body["data"]["echo"], order_id.as_str());

    let captured = harness.gateway.captured();
    assert_eq!(captured.len(), 1);
    let pay = &captured[0];
    assert_eq!(pay.authorization.as_deref(), Some("O-Bearer tok_1"));
    assert_eq!(pay.body["amount"], 10050);
    assert_eq!(pay.body["expireAfter"], 900);
    assert_eq!(pay.body["metaInfo"]["udf1"], "student-42");
    assert_eq!(pay.body["paymentFlow"]["type"], "PG_CHECKOUT");
    assert_eq!(pay.body["paymentFlow"]["message"], "Course fee");
    assert_eq!(
        pay.body["paymentFlow"]["merchantUrls"]["redirectUrl"],
        "https://shop.example/payment-callback"
    );
}

#[tokio::test]
async fn token_is_fetched_once_across_calls() {
    let harness = Harness::start(FakeGateway::default()).await;
    let client = build_reqwest_client();

    for _ in 0..3 {
        let res = client.get(harness.url("/order-status/order_1")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    assert_eq!(harness.gateway.token_calls.load(Ordering::SeqCst), 1);
    assert!(harness
        .gateway
        .captured()
        .iter()
        .all(|c| c.authorization.as_deref() == Some("O-Bearer tok_1")));
}

#[tokio::test]
async fn invalid_amount_is_rejected_before_any_upstream_call() {
    let harness = Harness::start(FakeGateway::default()).await;
    let client = build_reqwest_client();

    for payload in [json!({ "amount": 0 }), json!({ "amount": -5 }), json!({})] {
        let res = client.post(harness.url("/initiate-payment")).json(&payload).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid amount. Please enter a valid amount greater than 0.");
    }

    assert_eq!(harness.gateway.token_calls.load(Ordering::SeqCst), 0);
    assert!(harness.gateway.captured().is_empty());
}

#[tokio::test]
async fn order_status_wraps_upstream_data() {
    let harness = Harness::start(FakeGateway::default()).await;

    let res = build_reqwest_client()
        .get(harness.url("/order-status/order_1"))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["state"], "COMPLETED");
    assert_eq!(harness.gateway.captured()[0].path, "/checkout/v2/order/order_1/status");
}

#[tokio::test]
async fn upstream_error_is_relayed_in_envelope() {
    let harness = Harness::start(FakeGateway::default()).await;

    let res = build_reqwest_client()
        .get(harness.url("/order-status/missing"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();

    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Failed to fetch order status");
    assert_eq!(body["error"]["code"], "ORDER_NOT_FOUND");
}

#[tokio::test]
async fn token_rejection_surfaces_issuer_payload() {
    let gateway = FakeGateway { reject_tokens: true, ..Default::default() };
    let harness = Harness::start(gateway).await;

    let res = build_reqwest_client()
        .post(harness.url("/initiate-payment"))
        .json(&json!({ "amount": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();

    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Payment initiation failed");
    assert_eq!(body["error"]["code"], "INVALID_CLIENT");
    // checkout API never reached
    assert!(harness.gateway.captured().is_empty());
}

#[tokio::test]
async fn refund_generates_id_and_converts_amount() {
    let harness = Harness::start(FakeGateway::default()).await;

    let res = build_reqwest_client()
        .post(harness.url("/initiate-refund"))
        .json(&json!({ "merchantOrderId": "order_1", "refundAmount": 50, "reason": "duplicate" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();

    let refund_id = body["merchantRefundId"].as_str().unwrap();
    assert!(refund_id.starts_with("RF-"));
    assert_eq!(body["data"]["refundId"], "OMR123");

    let captured = harness.gateway.captured();
    assert_eq!(captured[0].body["merchantRefundId"], refund_id);
    assert_eq!(captured[0].body["originalMerchantOrderId"], "order_1");
    assert_eq!(captured[0].body["amount"], 5000);
    assert_eq!(captured[0].body["reason"], "duplicate");
}

#[tokio::test]
async fn refund_status_uses_caller_id() {
    let harness = Harness::start(FakeGateway::default()).await;

    let res = build_reqwest_client()
        .get(harness.url("/refund-status/RF-1700000000000"))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["merchantRefundId"], "RF-1700000000000");
}

#[tokio::test]
async fn callback_redirects_by_payment_state() {
    let harness = Harness::start(FakeGateway::default()).await;
    let client = build_reqwest_client();

    let cases = [
        (json!({ "merchantOrderId": "order_1", "state": "COMPLETED" }), "https://shop.example/success"),
        (json!({ "payload": { "merchantOrderId": "order_1", "state": "FAILED" } }), "https://shop.example/failure"),
        (json!({}), "https://shop.example/failure"),
    ];

    for (payload, expected) in cases {
        let res = client.post(harness.url("/payment-callback")).json(&payload).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[LOCATION], expected);
    }
}

#[tokio::test]
async fn form_posted_callback_redirects() {
    let harness = Harness::start(FakeGateway::default()).await;
    let client = build_reqwest_client();

    let cases = [
        ("status=SUCCESS&merchantOrderId=o-1", "https://shop.example/success"),
        ("state=FAILED&merchantOrderId=o-1", "https://shop.example/failure"),
    ];

    for (form, expected) in cases {
        let res = client
            .post(harness.url("/payment-callback"))
            .header("content-type", "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[LOCATION], expected);
    }
}

#[tokio::test]
async fn callback_without_readable_body_redirects_to_failure() {
    let harness = Harness::start(FakeGateway::default()).await;
    let client = build_reqwest_client();

    let empty = client.post(harness.url("/payment-callback")).send().await.unwrap();
    assert_eq!(empty.status(), StatusCode::FOUND);
    assert_eq!(empty.headers()[LOCATION], "https://shop.example/failure");

    let garbage = client
        .post(harness.url("/payment-callback"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::FOUND);
    assert_eq!(garbage.headers()[LOCATION], "https://shop.example/failure");
}

#[tokio::test]
async fn form_posted_webhook_is_acknowledged() {
    let harness = Harness::start(FakeGateway::default()).await;

    let res = build_reqwest_client()
        .post(harness.url("/webhook"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("state=COMPLETED&merchantOrderId=o-1")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn webhook_is_acknowledged() {
    let harness = Harness::start(FakeGateway::default()).await;

    let res = build_reqwest_client()
        .post(harness.url("/webhook"))
        .json(&json!({ "event": "checkout.order.completed", "payload": { "state": "COMPLETED" } }))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();

    assert_eq!(body, json!({ "success": true, "message": "Webhook received successfully" }));
    assert_eq!(harness.gateway.token_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn auth_token_endpoint_reports_cached_credential() {
    let harness = Harness::start(FakeGateway::default()).await;
    let client = build_reqwest_client();

    let first: Value = client.post(harness.url("/get-auth-token")).send().await.unwrap().json().await.unwrap();
    let second: Value = client.post(harness.url("/get-auth-token")).send().await.unwrap().json().await.unwrap();

    assert_eq!(first["success"], true);
    assert_eq!(first["data"]["accessToken"], "tok_1");
    assert_eq!(first["data"]["tokenType"], "O-Bearer");
    assert_eq!(first["data"]["encryptedAccessToken"], "enc");
    assert_eq!(first["data"]["sessionExpiresAt"], 1_700_001_200);
    assert!(first["data"]["expiresIn"].as_u64().unwrap() <= 1200);
    assert_eq!(second["data"]["accessToken"], "tok_1");
    assert_eq!(harness.gateway.token_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn auth_token_endpoint_is_hidden_unless_enabled() {
    let harness = Harness::start_with(FakeGateway::default(), |cfg| {
        cfg.settings.server.expose_token_endpoint = false;
    })
    .await;

    let res = build_reqwest_client().post(harness.url("/get-auth-token")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(harness.gateway.token_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn metrics_endpoint_exposes_relay_counters() {
    let harness = Harness::start(FakeGateway::default()).await;
    let client = build_reqwest_client();
    client.get(harness.url("/order-status/order_1")).send().await.unwrap();

    let res = client.get(harness.url("/metrics")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let text = res.text().await.unwrap();

    assert!(text.contains("paymentrelay_token_fetch_requests_total"));
    assert!(text.contains("paymentrelay_upstream_requests_total"));
}
