use crate::modules::grades::controller::{
    create_grade, delete_grade, get_grades, get_student_grades, update_grade,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

pub fn init_grades_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_grade).get(get_grades))
        .route("/student/{student_id}", get(get_student_grades))
        .route("/{id}", put(update_grade).delete(delete_grade))
}
