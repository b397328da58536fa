pub mod callback;
pub mod client;
pub mod models;

pub use client::GatewayClient;
