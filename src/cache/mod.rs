pub mod credential;
pub mod credential_cache;
pub mod token;

pub use credential::CachedCredential;
pub use credential_cache::CredentialCache;
