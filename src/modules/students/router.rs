use crate::modules::students::controller::{
    create_student, delete_student, get_dashboard, get_own_fees, get_own_grades, get_own_payments,
    get_phase, get_student, get_students, record_self_payment, update_profile, update_student,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin-managed student CRUD. The admin role layer is applied in the main
/// router.
pub fn init_students_admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_student).get(get_students))
        .route(
            "/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
}

/// Self-service routes. Any authenticated user may call them; ownership is
/// checked per handler.
pub fn init_students_self_router() -> Router<AppState> {
    Router::new()
        .route("/{id}/dashboard", get(get_dashboard))
        .route("/{id}/grades", get(get_own_grades))
        .route("/{id}/fees", get(get_own_fees))
        .route("/{id}/phase", get(get_phase))
        .route("/{id}/profile", put(update_profile))
        .route(
            "/{id}/payments",
            get(get_own_payments).post(record_self_payment),
        )
}
