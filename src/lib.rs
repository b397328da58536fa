//! # Payment Relay Library
//!
//! Relays merchant payment operations to the payment gateway's checkout API,
//! attaching access tokens drawn from an expiry-aware credential cache.
//!
//! Modules:
//! - `cache` — access-token record and the single-flight credential cache
//! - `sources` — token issuers (gateway identity endpoint)
//! - `parser` — validation of issuer responses
//! - `gateway` — checkout API client, payloads, callback inspection
//! - `server` — axum relay routes
//! - `config` — service configuration, loading and validation

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod helpers;
pub mod observability;
pub mod parser;
pub mod server;
pub mod sources;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::cache::{CachedCredential, CredentialCache};
pub use crate::config::settings::ServiceConfig;
pub use crate::error::{RelayError, UpstreamAuthError};
pub use crate::sources::{HttpTokenIssuer, TokenIssuer};
