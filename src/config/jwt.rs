//! Token signing configuration.
//!
//! `SHULE_JWT_SECRET` is required; the server refuses to start without it so
//! tokens are never signed with a known default.

use std::env;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
}

impl JwtConfig {
    /// # Panics
    ///
    /// Panics if `SHULE_JWT_SECRET` is unset.
    pub fn from_env() -> Self {
        Self {
            secret: env::var("SHULE_JWT_SECRET").expect("SHULE_JWT_SECRET must be set"),
            // Access tokens are short-lived; students refresh through
            // /api/auth/refresh.
            access_token_expiry: env::var("SHULE_ACCESS_TOKEN_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1800),
            refresh_token_expiry: env::var("SHULE_REFRESH_TOKEN_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(14 * 24 * 3600),
        }
    }
}
