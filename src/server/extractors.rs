//! Lenient body extractor for gateway-initiated posts.
//!
//! The payment return leg arrives from the shopper's browser, usually as a
//! form post; server-to-server webhooks send JSON. `NotificationBody` takes
//! either and never rejects: an absent or unreadable body becomes `Null`.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::{
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde_json::{Map, Value};
use tracing::debug;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub struct NotificationBody(pub Value);

impl<S> FromRequest<S> for NotificationBody
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE));

        let body = if is_form {
            match Form::<HashMap<String, String>>::from_request(req, state).await {
                Ok(Form(fields)) => form_to_value(fields),
                Err(e) => {
                    debug!("unreadable form body: {}", e);
                    Value::Null
                }
            }
        } else {
            match Json::<Value>::from_request(req, state).await {
                Ok(Json(value)) => value,
                Err(e) => {
                    debug!("unreadable json body: {}", e);
                    Value::Null
                }
            }
        };
        Ok(NotificationBody(body))
    }
}

fn form_to_value(fields: HashMap<String, String>) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<Map<String, Value>>(),
    )
}
