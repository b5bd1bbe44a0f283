mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{TestStudent, amount_paid, create_test_student, payment_count};
use shule_api::modules::payments::model::ConfirmedPayment;
use shule_api::modules::payments::service::{FinalizeOutcome, PaymentService, TransactionService};
use sqlx::PgPool;

async fn create_gateway_transaction(
    pool: &PgPool,
    student: &TestStudent,
    amount: f64,
    merchant_request_id: &str,
) {
    let transaction = TransactionService::create_pending(
        pool,
        student.user_id,
        student.student_id,
        "254712345678",
        amount,
        Some("School fees"),
    )
    .await
    .unwrap();

    TransactionService::attach_gateway_reference(pool, transaction.id, merchant_request_id)
        .await
        .unwrap();
}

fn confirmed(amount: f64, receipt: &str) -> ConfirmedPayment {
    ConfirmedPayment {
        amount,
        receipt_number: receipt.to_string(),
        phone: "254712345678".to_string(),
        trans_date: Utc::now(),
        payer_names: Some("John Doe".to_string()),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_successful_callback_creates_one_payment_and_credits_balance(pool: PgPool) {
    let student = create_test_student(&pool, 50000.0, 20000.0).await;
    create_gateway_transaction(&pool, &student, 10000.0, "29115-34620561-1").await;

    let outcome =
        TransactionService::finalize_success(&pool, "29115-34620561-1", &confirmed(10000.0, "NLJ7RT61SV"))
            .await
            .unwrap();

    let FinalizeOutcome::Finalized(transaction) = outcome else {
        panic!("expected the pending transaction to be finalized");
    };
    assert_eq!(transaction.status, "success");
    assert_eq!(transaction.mpesa_receipt_number.as_deref(), Some("NLJ7RT61SV"));
    assert!(transaction.payment_id.is_some());

    assert_eq!(amount_paid(&pool, student.student_id).await, 30000.0);
    assert_eq!(payment_count(&pool, student.student_id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_success_callback_does_not_double_credit(pool: PgPool) {
    let student = create_test_student(&pool, 50000.0, 20000.0).await;
    create_gateway_transaction(&pool, &student, 10000.0, "29115-34620561-2").await;
    let payload = confirmed(10000.0, "NLJ7RT61SW");

    let first = TransactionService::finalize_success(&pool, "29115-34620561-2", &payload)
        .await
        .unwrap();
    assert!(matches!(first, FinalizeOutcome::Finalized(_)));

    let second = TransactionService::finalize_success(&pool, "29115-34620561-2", &payload)
        .await
        .unwrap();
    assert!(matches!(second, FinalizeOutcome::AlreadyFinal(_)));

    assert_eq!(amount_paid(&pool, student.student_id).await, 30000.0);
    assert_eq!(payment_count(&pool, student.student_id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_gateway_reference_mutates_nothing(pool: PgPool) {
    let student = create_test_student(&pool, 50000.0, 20000.0).await;
    create_gateway_transaction(&pool, &student, 10000.0, "29115-34620561-3").await;

    let err = TransactionService::finalize_success(&pool, "no-such-reference", &confirmed(10000.0, "NLJ7RT61SX"))
        .await
        .unwrap_err();

    assert_eq!(err.status, StatusCode::NOT_FOUND);
    assert_eq!(amount_paid(&pool, student.student_id).await, 20000.0);
    assert_eq!(payment_count(&pool, student.student_id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_failure_callback_records_description_without_payment(pool: PgPool) {
    let student = create_test_student(&pool, 50000.0, 20000.0).await;
    create_gateway_transaction(&pool, &student, 10000.0, "29115-34620561-4").await;

    let outcome =
        TransactionService::finalize_failure(&pool, "29115-34620561-4", "Request cancelled by user")
            .await
            .unwrap();

    let FinalizeOutcome::Finalized(transaction) = outcome else {
        panic!("expected the pending transaction to be finalized");
    };
    assert_eq!(transaction.status, "Request cancelled by user");
    assert!(transaction.payment_id.is_none());

    let repeat =
        TransactionService::finalize_failure(&pool, "29115-34620561-4", "Request cancelled by user")
            .await
            .unwrap();
    assert!(matches!(repeat, FinalizeOutcome::AlreadyFinal(_)));

    assert_eq!(amount_paid(&pool, student.student_id).await, 20000.0);
    assert_eq!(payment_count(&pool, student.student_id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_payment_reverses_ledger_exactly(pool: PgPool) {
    let student = create_test_student(&pool, 50000.0, 20000.0).await;
    create_gateway_transaction(&pool, &student, 10000.0, "29115-34620561-5").await;

    TransactionService::finalize_success(&pool, "29115-34620561-5", &confirmed(10000.0, "NLJ7RT61SY"))
        .await
        .unwrap();
    assert_eq!(amount_paid(&pool, student.student_id).await, 30000.0);

    let transaction = TransactionService::find_by_gateway_reference(&pool, "29115-34620561-5")
        .await
        .unwrap();
    let payment_id = transaction.payment_id.unwrap();

    PaymentService::delete_payment(&pool, payment_id).await.unwrap();

    assert_eq!(amount_paid(&pool, student.student_id).await, 20000.0);
    assert_eq!(payment_count(&pool, student.student_id).await, 0);

    // The ledger row survives the payment deletion with the link nulled.
    let transaction = TransactionService::find_by_gateway_reference(&pool, "29115-34620561-5")
        .await
        .unwrap();
    assert!(transaction.payment_id.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_payment_never_drives_balance_negative(pool: PgPool) {
    let student = create_test_student(&pool, 50000.0, 0.0).await;
    let payment = PaymentService::record_self_service_payment(
        &pool,
        student.student_id,
        10000.0,
        Some("Term one fees".to_string()),
    )
    .await
    .unwrap();

    // An out-of-band correction leaves less on the ledger than the payment.
    sqlx::query("UPDATE fee_balances SET amount_paid = 4000 WHERE student_id = $1")
        .bind(student.student_id)
        .execute(&pool)
        .await
        .unwrap();

    let err = PaymentService::delete_payment(&pool, payment.id).await.unwrap_err();

    assert_eq!(err.status, StatusCode::CONFLICT);
    assert_eq!(amount_paid(&pool, student.student_id).await, 4000.0);
    assert_eq!(payment_count(&pool, student.student_id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_self_service_payment_worked_example(pool: PgPool) {
    let student = create_test_student(&pool, 50000.0, 20000.0).await;

    PaymentService::record_self_service_payment(&pool, student.student_id, 10000.0, None)
        .await
        .unwrap();
    assert_eq!(amount_paid(&pool, student.student_id).await, 30000.0);

    // Remaining is 20000, so a 35000 payment would overshoot the amount due.
    let err = PaymentService::record_self_service_payment(&pool, student.student_id, 35000.0, None)
        .await
        .unwrap_err();

    assert_eq!(err.status, StatusCode::CONFLICT);
    assert_eq!(amount_paid(&pool, student.student_id).await, 30000.0);
    assert_eq!(payment_count(&pool, student.student_id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_self_service_rejects_non_positive_amount(pool: PgPool) {
    let student = create_test_student(&pool, 50000.0, 0.0).await;

    let err = PaymentService::record_self_service_payment(&pool, student.student_id, 0.0, None)
        .await
        .unwrap_err();

    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(payment_count(&pool, student.student_id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_self_service_rejects_ceiling_breach(pool: PgPool) {
    let student = create_test_student(&pool, 500000.0, 195000.0).await;

    let err = PaymentService::record_self_service_payment(&pool, student.student_id, 10000.0, None)
        .await
        .unwrap_err();

    assert_eq!(err.status, StatusCode::CONFLICT);
    assert_eq!(amount_paid(&pool, student.student_id).await, 195000.0);
    assert_eq!(payment_count(&pool, student.student_id).await, 0);
}
