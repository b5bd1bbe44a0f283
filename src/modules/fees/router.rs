use crate::modules::fees::controller::{
    create_balance, delete_balance, get_balance, get_balances, update_balance,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_fees_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_balance).get(get_balances))
        .route(
            "/{student_id}",
            get(get_balance).put(update_balance).delete(delete_balance),
        )
}
