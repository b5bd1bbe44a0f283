use crate::modules::courses::controller::{
    assign_unit, create_course, create_unit, get_course, get_course_units, get_courses,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_course).get(get_courses))
        .route("/{id}", get(get_course))
        .route("/{id}/units", post(assign_unit).get(get_course_units))
}

pub fn init_units_router() -> Router<AppState> {
    Router::new().route("/", post(create_unit))
}
