use crate::modules::payments::controller::{
    confirm_payment, delete_payment, get_payments, mpesa_callback, new_mpesa_payment,
    record_payment,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Authenticated payment routes plus the unauthenticated gateway callback.
/// The callback carries no bearer token by design; correlation happens via
/// the merchant request id.
pub fn init_payments_router() -> Router<AppState> {
    Router::new()
        .route("/new", post(new_mpesa_payment))
        .route("/confirm/{id}", get(confirm_payment))
        .route("/callback", post(mpesa_callback))
}

/// Admin-only payment routes; the caller layers the role check.
pub fn init_payments_admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_payments))
        .route("/record", post(record_payment))
        .route("/{id}", delete(delete_payment))
}
