//! Payment callback inspection.
//!
//! Gateway notifications have shipped in several shapes: the state may be
//! called `state` or `status`, and may sit at the top level or under
//! `payload` / `data`. Lookups walk all of them.

use serde_json::Value;

const STATE_KEYS: [&str; 2] = ["state", "status"];
const ORDER_ID_KEYS: [&str; 2] = ["merchantOrderId", "originalMerchantOrderId"];
const NESTED_KEYS: [&str; 2] = ["payload", "data"];
const SUCCESS_STATES: [&str; 2] = ["COMPLETED", "SUCCESS"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    Success,
    Failure,
}

impl CallbackOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackOutcome::Success => "success",
            CallbackOutcome::Failure => "failure",
        }
    }
}

pub fn payment_state(body: &Value) -> Option<&str> {
    find_string(body, &STATE_KEYS)
}

pub fn merchant_order_id(body: &Value) -> Option<&str> {
    find_string(body, &ORDER_ID_KEYS)
}

/// Anything other than an explicit success state counts as failure.
pub fn outcome(body: &Value) -> CallbackOutcome {
    match payment_state(body) {
        Some(state) if SUCCESS_STATES.iter().any(|s| s.eq_ignore_ascii_case(state)) => CallbackOutcome::Success,
        _ => CallbackOutcome::Failure,
    }
}

fn find_string<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a str> {
    let top = keys.iter().find_map(|key| body.get(*key).and_then(Value::as_str));
    top.or_else(|| {
        NESTED_KEYS
            .iter()
            .filter_map(|nested| body.get(*nested))
            .find_map(|inner| keys.iter().find_map(|key| inner.get(*key).and_then(Value::as_str)))
    })
}
