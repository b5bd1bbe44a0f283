use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::payments::gateway::MpesaGateway;
use crate::modules::payments::model::{
    CallbackDecision, InitiatePaymentResponse, NewMpesaPaymentDto, Payment, RecordPaymentDto,
    StkCallbackEnvelope, Transaction, evaluate_callback,
};
use crate::modules::payments::service::{PaymentService, TransactionService};
use crate::modules::students::service::StudentService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;
use axum::http::StatusCode;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::{instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Acknowledgement body the gateway expects from its callback.
#[derive(Serialize, Debug, ToSchema)]
pub struct CallbackAck {
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
}

impl CallbackAck {
    fn accepted() -> Self {
        CallbackAck {
            result_code: 0,
            result_desc: "Accepted".to_string(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/payments/new",
    request_body = NewMpesaPaymentDto,
    responses(
        (status = 200, description = "Payment initiated, awaiting gateway callback", body = InitiatePaymentResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 502, description = "Gateway rejected the request", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
#[instrument(skip(state, dto))]
pub async fn new_mpesa_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<NewMpesaPaymentDto>,
) -> Result<Json<InitiatePaymentResponse>, AppError> {
    let user_id = auth_user.user_id()?;
    StudentService::get_student(&state.db, dto.student_id).await?;

    let phone = MpesaGateway::normalize_phone(&dto.phone);

    // The pending row goes in first so the attempt is on record even if the
    // gateway call below fails. No database transaction is held across the
    // outbound HTTP requests.
    let transaction = TransactionService::create_pending(
        &state.db,
        user_id,
        dto.student_id,
        &phone,
        dto.amount,
        dto.description.as_deref(),
    )
    .await?;

    let token = state.gateway.authenticate().await?;
    let push = state
        .gateway
        .initiate_payment(
            &token,
            &phone,
            dto.amount,
            &transaction.reference,
            dto.description.as_deref().unwrap_or("School fees"),
        )
        .await?;

    let transaction = TransactionService::attach_gateway_reference(
        &state.db,
        transaction.id,
        &push.merchant_request_id,
    )
    .await?;

    Ok(Json(InitiatePaymentResponse {
        success: true,
        message: "Payment initiated. Approve the prompt on your phone.".to_string(),
        transaction_id: transaction.id,
    }))
}

#[utoipa::path(
    get,
    path = "/api/payments/confirm/{id}",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Current transaction state", body = Transaction),
        (status = 404, description = "Transaction not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
#[instrument(skip(state))]
pub async fn confirm_payment(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, AppError> {
    let transaction = TransactionService::find_by_id(&state.db, id).await?;
    Ok(Json(transaction))
}

#[utoipa::path(
    post,
    path = "/api/payments/callback",
    request_body = StkCallbackEnvelope,
    responses(
        (status = 200, description = "Callback processed", body = CallbackAck),
        (status = 404, description = "Unknown correlation id", body = ErrorResponse),
        (status = 422, description = "Malformed callback payload", body = ErrorResponse)
    ),
    tag = "Payments"
)]
#[instrument(skip(state, envelope))]
pub async fn mpesa_callback(
    State(state): State<AppState>,
    Json(envelope): Json<StkCallbackEnvelope>,
) -> Result<Json<CallbackAck>, AppError> {
    let callback = envelope.body.stk_callback;

    if callback.merchant_request_id.is_empty() {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "Callback is missing the merchant request id"
        )));
    }

    // Validation happens before any write; a malformed payload must not leave
    // partial state behind.
    let decision = evaluate_callback(&callback)
        .map_err(|e| AppError::unprocessable(anyhow::anyhow!(e.message())))?;

    match decision {
        CallbackDecision::Success(confirmed) => {
            let existing = TransactionService::find_by_gateway_reference(
                &state.db,
                &callback.merchant_request_id,
            )
            .await?;
            if (confirmed.amount - existing.amount).abs() > f64::EPSILON {
                warn!(
                    reference = %existing.reference,
                    requested = existing.amount,
                    confirmed = confirmed.amount,
                    "Gateway-confirmed amount diverges from the initiated amount"
                );
            }

            TransactionService::finalize_success(
                &state.db,
                &callback.merchant_request_id,
                &confirmed,
            )
            .await?;
        }
        CallbackDecision::Failure { description, .. } => {
            TransactionService::finalize_failure(
                &state.db,
                &callback.merchant_request_id,
                &description,
            )
            .await?;
        }
    }

    Ok(Json(CallbackAck::accepted()))
}

#[utoipa::path(
    post,
    path = "/api/payments/record",
    request_body = RecordPaymentDto,
    responses(
        (status = 201, description = "Payment recorded", body = Payment),
        (status = 403, description = "Forbidden - Admin only", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
#[instrument(skip(state, dto))]
pub async fn record_payment(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RecordPaymentDto>,
) -> Result<(StatusCode, Json<Payment>), AppError> {
    let payment = PaymentService::record_payment(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[utoipa::path(
    get,
    path = "/api/payments",
    responses(
        (status = 200, description = "All recorded payments", body = [Payment])
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
#[instrument(skip(state))]
pub async fn get_payments(State(state): State<AppState>) -> Result<Json<Vec<Payment>>, AppError> {
    let payments = PaymentService::get_payments(&state.db).await?;
    Ok(Json(payments))
}

#[utoipa::path(
    delete,
    path = "/api/payments/{id}",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 204, description = "Payment deleted and ledger reversed"),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 409, description = "Reversal would leave a negative balance", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
#[instrument(skip(state))]
pub async fn delete_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    PaymentService::delete_payment(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
