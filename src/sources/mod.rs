/// Sources module
///
/// Token issuers the credential cache can draw fresh tokens from.
pub mod issuer;

pub use issuer::{HttpTokenIssuer, TokenIssuer};
