use crate::modules::auth::controller::ErrorResponse;
use crate::modules::fees::model::{
    CreateFeeBalanceDto, FeeBalance, FeeBalanceWithStudent, UpdateFeeBalanceDto,
};
use crate::modules::fees::service::FeeService;
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
    path = "/api/fees",
    request_body = CreateFeeBalanceDto,
    responses(
        (status = 201, description = "Fee balance created", body = FeeBalance),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 409, description = "Student already has a balance", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fees"
)]
#[instrument(skip(state, dto))]
pub async fn create_balance(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateFeeBalanceDto>,
) -> Result<(StatusCode, Json<FeeBalance>), AppError> {
    let balance = FeeService::create_balance(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(balance)))
}

#[utoipa::path(
    get,
    path = "/api/fees",
    responses(
        (status = 200, description = "All fee balances", body = [FeeBalanceWithStudent])
    ),
    security(("bearer_auth" = [])),
    tag = "Fees"
)]
#[instrument(skip(state))]
pub async fn get_balances(
    State(state): State<AppState>,
) -> Result<Json<Vec<FeeBalanceWithStudent>>, AppError> {
    let balances = FeeService::get_balances(&state.db).await?;
    Ok(Json(balances))
}

#[utoipa::path(
    get,
    path = "/api/fees/{student_id}",
    params(("student_id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Fee balance for the student", body = FeeBalance),
        (status = 404, description = "Fee balance not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fees"
)]
#[instrument(skip(state))]
pub async fn get_balance(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> Result<Json<FeeBalance>, AppError> {
    let balance = FeeService::get_balance_by_student(&state.db, student_id).await?;
    Ok(Json(balance))
}

#[utoipa::path(
    put,
    path = "/api/fees/{student_id}",
    params(("student_id" = Uuid, Path, description = "Student ID")),
    request_body = UpdateFeeBalanceDto,
    responses(
        (status = 200, description = "Fee balance updated", body = FeeBalance),
        (status = 404, description = "Fee balance not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fees"
)]
#[instrument(skip(state, dto))]
pub async fn update_balance(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateFeeBalanceDto>,
) -> Result<Json<FeeBalance>, AppError> {
    let balance = FeeService::update_balance(&state.db, student_id, dto).await?;
    Ok(Json(balance))
}

#[utoipa::path(
    delete,
    path = "/api/fees/{student_id}",
    params(("student_id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Fee balance deleted"),
        (status = 404, description = "Fee balance not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fees"
)]
#[instrument(skip(state))]
pub async fn delete_balance(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    FeeService::delete_balance(&state.db, student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
