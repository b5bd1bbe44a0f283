use crate::modules::auth::controller::ErrorResponse;
use crate::modules::courses::model::{
    AssignUnitDto, Course, CourseUnit, CreateCourseDto, CreateUnitDto, Unit,
};
use crate::modules::courses::service::CourseService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;
use axum::http::StatusCode;
use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 403, description = "Forbidden - Admin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, dto))]
pub async fn create_course(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = CourseService::create_course(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "List of courses", body = [Course])
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = CourseService::get_courses(&state.db).await?;
    Ok(Json(courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course details", body = Course),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::get_course(&state.db, id).await?;
    Ok(Json(course))
}

#[utoipa::path(
    post,
    path = "/api/units",
    request_body = CreateUnitDto,
    responses(
        (status = 201, description = "Unit created", body = Unit),
        (status = 403, description = "Forbidden - Admin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, dto))]
pub async fn create_unit(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateUnitDto>,
) -> Result<(StatusCode, Json<Unit>), AppError> {
    let unit = CourseService::create_unit(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/units",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = AssignUnitDto,
    responses(
        (status = 201, description = "Unit assigned to course", body = CourseUnit),
        (status = 404, description = "Course or unit not found", body = ErrorResponse),
        (status = 409, description = "Unit already assigned", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, dto))]
pub async fn assign_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AssignUnitDto>,
) -> Result<(StatusCode, Json<CourseUnit>), AppError> {
    let course_unit = CourseService::assign_unit(&state.db, id, dto).await?;
    Ok((StatusCode::CREATED, Json(course_unit)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/units",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Units taught in the course", body = [CourseUnit])
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_course_units(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CourseUnit>>, AppError> {
    let units = CourseService::get_course_units(&state.db, id).await?;
    Ok(Json(units))
}
