use crate::middleware::auth::AuthUser;
use crate::middleware::role::check_student_access;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::fees::model::FeeBalance;
use crate::modules::fees::service::FeeService;
use crate::modules::grades::model::GradeWithCourse;
use crate::modules::grades::service::GradeService;
use crate::modules::payments::model::{Payment, SelfServicePaymentDto};
use crate::modules::payments::service::PaymentService;
use crate::modules::students::model::{
    CreateStudentDto, PhaseResponse, Student, StudentDashboard, UpdateProfileDto, UpdateStudentDto,
};
use crate::modules::students::service::StudentService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;
use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/students",
    request_body = CreateStudentDto,
    responses(
        (status = 201, description = "Student created successfully", body = Student),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - Admin only", body = ErrorResponse),
        (status = 409, description = "Username or email already exists", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state, dto))]
pub async fn create_student(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateStudentDto>,
) -> Result<(axum::http::StatusCode, Json<Student>), AppError> {
    let student = StudentService::create_student(&state.db, dto).await?;
    Ok((axum::http::StatusCode::CREATED, Json(student)))
}

#[utoipa::path(
    get,
    path = "/api/students",
    responses(
        (status = 200, description = "List of students", body = [Student]),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - Admin only", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_students(State(state): State<AppState>) -> Result<Json<Vec<Student>>, AppError> {
    let students = StudentService::get_students(&state.db).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student details", body = Student),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Student>, AppError> {
    let student = StudentService::get_student(&state.db, id).await?;
    Ok(Json(student))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    request_body = UpdateStudentDto,
    responses(
        (status = 200, description = "Student updated successfully", body = Student),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state, dto))]
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateStudentDto>,
) -> Result<Json<Student>, AppError> {
    let student = StudentService::update_student(&state.db, id, dto).await?;
    Ok(Json(student))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student deleted successfully"),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    StudentService::delete_student(&state.db, id).await?;
    Ok(Json(json!({"message": "Student deleted successfully"})))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/dashboard",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student dashboard", body = StudentDashboard),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentDashboard>, AppError> {
    let student = StudentService::get_student(&state.db, id).await?;
    check_student_access(&auth_user, student.user_id)?;

    let dashboard = StudentService::get_dashboard(&state.db, id).await?;
    Ok(Json(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/grades",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student grades", body = [GradeWithCourse]),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_own_grades(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GradeWithCourse>>, AppError> {
    let student = StudentService::get_student(&state.db, id).await?;
    check_student_access(&auth_user, student.user_id)?;

    let grades = GradeService::get_grades_by_student(&state.db, id).await?;
    Ok(Json(grades))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/fees",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student fee balance", body = FeeBalance),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Fee balance not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_own_fees(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FeeBalance>, AppError> {
    let student = StudentService::get_student(&state.db, id).await?;
    check_student_access(&auth_user, student.user_id)?;

    let balance = FeeService::get_balance_by_student(&state.db, id).await?;
    Ok(Json(balance))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/phase",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Current phase", body = PhaseResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_phase(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PhaseResponse>, AppError> {
    let student = StudentService::get_student(&state.db, id).await?;
    check_student_access(&auth_user, student.user_id)?;

    Ok(Json(PhaseResponse {
        current_phase: student.current_phase,
    }))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}/profile",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = Student),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state, dto))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<Json<Student>, AppError> {
    let student = StudentService::get_student(&state.db, id).await?;
    check_student_access(&auth_user, student.user_id)?;

    let updated = StudentService::update_profile(&state.db, id, dto).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/payments",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Payments made by the student", body = [Payment]),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_own_payments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let student = StudentService::get_student(&state.db, id).await?;
    check_student_access(&auth_user, student.user_id)?;

    let payments = PaymentService::get_payments_by_student(&state.db, id).await?;
    Ok(Json(payments))
}

/// Self-service fee payment. Applies the business-rule guards before any
/// write: positive amount, the 200,000 paid ceiling, and no overpayment past
/// the amount due.
#[utoipa::path(
    post,
    path = "/api/students/{id}/payments",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    request_body = SelfServicePaymentDto,
    responses(
        (status = 201, description = "Payment recorded", body = Payment),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Fee balance not found", body = ErrorResponse),
        (status = 409, description = "Payment violates fee balance rules", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state, dto))]
pub async fn record_self_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<SelfServicePaymentDto>,
) -> Result<(axum::http::StatusCode, Json<Payment>), AppError> {
    let student = StudentService::get_student(&state.db, id).await?;
    check_student_access(&auth_user, student.user_id)?;

    let payment =
        PaymentService::record_self_service_payment(&state.db, id, dto.amount, dto.description)
            .await?;
    Ok((axum::http::StatusCode::CREATED, Json(payment)))
}
