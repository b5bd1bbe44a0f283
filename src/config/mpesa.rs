//! M-Pesa gateway configuration.
//!
//! All gateway credentials and endpoints are injected from the environment.
//!
//! # Environment Variables
//!
//! - `MPESA_CONSUMER_KEY` / `MPESA_CONSUMER_SECRET`: OAuth client credentials
//! - `MPESA_SHORTCODE`: business shortcode (PartyB)
//! - `MPESA_PASSKEY`: Lipa na M-Pesa online passkey
//! - `MPESA_AUTH_URL`: OAuth token endpoint
//! - `MPESA_STK_URL`: STK push endpoint
//! - `MPESA_CALLBACK_URL`: publicly reachable callback URL the gateway invokes
//! - `MPESA_TIMEOUT_SECS`: outbound request timeout (default 30)

use std::env;

#[derive(Clone, Debug)]
pub struct MpesaConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub shortcode: String,
    pub passkey: String,
    pub auth_url: String,
    pub stk_url: String,
    pub callback_url: String,
    pub timeout_secs: u64,
}

impl MpesaConfig {
    pub fn from_env() -> Self {
        Self {
            consumer_key: env::var("MPESA_CONSUMER_KEY").unwrap_or_default(),
            consumer_secret: env::var("MPESA_CONSUMER_SECRET").unwrap_or_default(),
            shortcode: env::var("MPESA_SHORTCODE").unwrap_or_else(|_| "174379".to_string()),
            passkey: env::var("MPESA_PASSKEY").unwrap_or_default(),
            auth_url: env::var("MPESA_AUTH_URL").unwrap_or_else(|_| {
                "https://sandbox.safaricom.co.ke/oauth/v1/generate?grant_type=client_credentials"
                    .to_string()
            }),
            stk_url: env::var("MPESA_STK_URL").unwrap_or_else(|_| {
                "https://sandbox.safaricom.co.ke/mpesa/stkpush/v1/processrequest".to_string()
            }),
            callback_url: env::var("MPESA_CALLBACK_URL")
                .unwrap_or_else(|_| "http://localhost:3000/api/payments/callback".to_string()),
            timeout_secs: env::var("MPESA_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}
