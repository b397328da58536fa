use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelayError;

/// ================================
/// Relay inputs
/// ================================

/// What a merchant asks for when starting a checkout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitiation {
    /// rupees; converted to paise upstream
    pub amount: Option<f64>,
    pub redirect_url: Option<String>,
    pub message: Option<String>,
    pub meta_info: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundInitiation {
    pub merchant_order_id: String,
    /// rupees; converted to paise upstream
    pub refund_amount: f64,
    pub reason: Option<String>,
    pub merchant_refund_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInitiated {
    pub merchant_order_id: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefundInitiated {
    pub merchant_refund_id: String,
    pub data: Value,
}

/// ================================
/// Upstream payloads
/// ================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub merchant_order_id: String,
    /// paise
    pub amount: u64,
    pub expire_after: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_info: Option<HashMap<String, String>>,
    pub payment_flow: PaymentFlow,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFlow {
    #[serde(rename = "type")]
    pub flow_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub merchant_urls: MerchantUrlsPayload,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantUrlsPayload {
    pub redirect_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundPayload {
    pub merchant_refund_id: String,
    pub original_merchant_order_id: String,
    /// paise
    pub amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Convert a rupee amount to whole paise.
///
/// Rejects non-finite, non-positive and sub-paisa amounts.
pub fn amount_to_paise(amount: f64) -> Result<u64, RelayError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(RelayError::InvalidRequest(
            "Invalid amount. Please enter a valid amount greater than 0.".to_string(),
        ));
    }
    let paise = (amount * 100.0).round();
    if paise < 1.0 || paise > u64::MAX as f64 {
        return Err(RelayError::InvalidRequest(
            "Invalid amount. Please enter a valid amount greater than 0.".to_string(),
        ));
    }
    Ok(paise as u64)
}

/// Identifiers end up in upstream paths; keep them to `[A-Za-z0-9_-]`.
pub fn validate_identifier<'a>(kind: &str, value: &'a str) -> Result<&'a str, RelayError> {
    let valid = !value.is_empty()
        && value.len() <= 64
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(value)
    } else {
        Err(RelayError::InvalidRequest(format!("Invalid {}: '{}'", kind, value)))
    }
}
