//! Shared constants and invariants

pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";
pub const PAYMENT_FLOW_PG_CHECKOUT: &str = "PG_CHECKOUT";

// Upper bound on an issuer-reported token lifetime (30 days)
pub const MAX_TOKEN_LIFETIME_SECONDS: u64 = 60 * 60 * 24 * 30;

// Upstream checkout API paths, relative to gateway.base_url
pub const PAY_PATH: &str = "/checkout/v2/pay";
pub const ORDER_PATH: &str = "/checkout/v2/order";
pub const REFUND_PATH: &str = "/payments/v2/refund";

// Relay routes
pub const ROUTE_INITIATE_PAYMENT: &str = "/initiate-payment";
pub const ROUTE_ORDER_STATUS: &str = "/order-status";
pub const ROUTE_INITIATE_REFUND: &str = "/initiate-refund";
pub const ROUTE_REFUND_STATUS: &str = "/refund-status";
pub const ROUTE_PAYMENT_CALLBACK: &str = "/payment-callback";
pub const ROUTE_WEBHOOK: &str = "/webhook";
pub const ROUTE_AUTH_TOKEN: &str = "/get-auth-token";

pub const RELAY_ROUTES: [&str; 7] = [
    ROUTE_INITIATE_PAYMENT,
    ROUTE_ORDER_STATUS,
    ROUTE_INITIATE_REFUND,
    ROUTE_REFUND_STATUS,
    ROUTE_PAYMENT_CALLBACK,
    ROUTE_WEBHOOK,
    ROUTE_AUTH_TOKEN,
];
