use anyhow::Context;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::fees::model::SelfPaymentError;
use crate::modules::fees::service::FeeService;
use crate::modules::payments::model::{
    ConfirmedPayment, Payment, RecordPaymentDto, Transaction,
};
use crate::utils::errors::AppError;

const TRANSACTION_COLUMNS: &str = "id, reference, status, phone, amount, trans_date, \
     mpesa_receipt_number, payer_names, user_id, student_id, description, \
     merchant_request_id, payment_id, created_at, updated_at";

const PAYMENT_COLUMNS: &str =
    "id, student_id, amount, payment_date, description, created_at, updated_at";

/// Result of applying a terminal gateway callback.
#[derive(Debug)]
pub enum FinalizeOutcome {
    /// The pending row was transitioned by this call.
    Finalized(Transaction),
    /// The row was already terminal; nothing was written.
    AlreadyFinal(Transaction),
}

pub struct TransactionService;

impl TransactionService {
    /// Inserts the "pending" ledger row. Runs before the gateway call so an
    /// attempt is recorded even if the outbound request then fails.
    #[instrument(skip(db, description))]
    pub async fn create_pending(
        db: &PgPool,
        user_id: Uuid,
        student_id: Uuid,
        phone: &str,
        amount: f64,
        description: Option<&str>,
    ) -> Result<Transaction, AppError> {
        let reference = format!("SCH-{}", Uuid::new_v4().simple());

        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "INSERT INTO transactions (reference, phone, amount, user_id, student_id, description)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(&reference)
        .bind(phone)
        .bind(amount)
        .bind(user_id)
        .bind(student_id)
        .bind(description)
        .fetch_one(db)
        .await
        .context("Failed to record pending transaction")
        .map_err(AppError::database)?;

        Ok(transaction)
    }

    /// One-time write of the gateway correlation key. A second attach for the
    /// same transaction is a conflict, never an overwrite.
    #[instrument(skip(db))]
    pub async fn attach_gateway_reference(
        db: &PgPool,
        id: Uuid,
        merchant_request_id: &str,
    ) -> Result<Transaction, AppError> {
        let updated = sqlx::query_as::<_, Transaction>(&format!(
            "UPDATE transactions
             SET merchant_request_id = $1, updated_at = NOW()
             WHERE id = $2 AND merchant_request_id IS NULL
             RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(merchant_request_id)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict(anyhow::anyhow!(
                        "Gateway reference is already attached to another transaction"
                    ));
                }
            }
            AppError::database(anyhow::Error::from(e))
        })?;

        match updated {
            Some(transaction) => Ok(transaction),
            None => {
                Self::find_by_id(db, id).await?;
                Err(AppError::conflict(anyhow::anyhow!(
                    "Transaction already has a gateway reference"
                )))
            }
        }
    }

    #[instrument(skip(db))]
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Transaction, AppError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch transaction")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Transaction not found")))?;

        Ok(transaction)
    }

    #[instrument(skip(db))]
    pub async fn find_by_gateway_reference(
        db: &PgPool,
        merchant_request_id: &str,
    ) -> Result<Transaction, AppError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE merchant_request_id = $1"
        ))
        .bind(merchant_request_id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch transaction by gateway reference")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Transaction not found")))?;

        Ok(transaction)
    }

    /// Applies a successful callback. The status flip is a compare-and-set on
    /// "pending", so at-least-once callback delivery cannot double-create the
    /// payment or double-credit the fee balance. Transaction row, payment row
    /// and ledger credit commit together or not at all.
    #[instrument(skip(db, confirmed))]
    pub async fn finalize_success(
        db: &PgPool,
        merchant_request_id: &str,
        confirmed: &ConfirmedPayment,
    ) -> Result<FinalizeOutcome, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to open transaction")
            .map_err(AppError::database)?;

        let claimed = sqlx::query_as::<_, Transaction>(&format!(
            "UPDATE transactions
             SET status = 'success',
                 mpesa_receipt_number = $1,
                 payer_names = $2,
                 amount = $3,
                 phone = $4,
                 trans_date = $5,
                 updated_at = NOW()
             WHERE merchant_request_id = $6 AND status = 'pending'
             RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(&confirmed.receipt_number)
        .bind(&confirmed.payer_names)
        .bind(confirmed.amount)
        .bind(&confirmed.phone)
        .bind(confirmed.trans_date)
        .bind(merchant_request_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict(anyhow::anyhow!(
                        "Receipt number already recorded"
                    ));
                }
            }
            AppError::database(anyhow::Error::from(e))
        })?;

        let Some(transaction) = claimed else {
            tx.rollback()
                .await
                .context("Failed to roll back")
                .map_err(AppError::database)?;

            let existing = Self::find_by_gateway_reference(db, merchant_request_id).await?;
            if !existing.status().is_terminal() {
                return Err(AppError::conflict(anyhow::anyhow!(
                    "Transaction is being finalized by a concurrent update"
                )));
            }
            info!(
                reference = %existing.reference,
                status = %existing.status,
                "Duplicate callback for terminal transaction ignored"
            );
            return Ok(FinalizeOutcome::AlreadyFinal(existing));
        };

        let payment = sqlx::query_as::<_, Payment>(&format!(
            "INSERT INTO payments (student_id, amount, payment_date, description)
             VALUES ($1, $2, $3, $4)
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(transaction.student_id)
        .bind(confirmed.amount)
        .bind(confirmed.trans_date)
        .bind(&transaction.description)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create payment from callback")
        .map_err(AppError::database)?;

        FeeService::apply_payment(&mut tx, transaction.student_id, confirmed.amount).await?;

        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "UPDATE transactions SET payment_id = $1, updated_at = NOW() WHERE id = $2
             RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(payment.id)
        .bind(transaction.id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to link payment to transaction")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit payment finalization")
            .map_err(AppError::database)?;

        info!(
            reference = %transaction.reference,
            payment_id = %payment.id,
            "Transaction finalized as success"
        );
        Ok(FinalizeOutcome::Finalized(transaction))
    }

    /// Records a terminal failure. Same compare-and-set guard as the success
    /// path; the gateway's description becomes the stored status.
    #[instrument(skip(db))]
    pub async fn finalize_failure(
        db: &PgPool,
        merchant_request_id: &str,
        description: &str,
    ) -> Result<FinalizeOutcome, AppError> {
        let claimed = sqlx::query_as::<_, Transaction>(&format!(
            "UPDATE transactions
             SET status = $1, updated_at = NOW()
             WHERE merchant_request_id = $2 AND status = 'pending'
             RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(description)
        .bind(merchant_request_id)
        .fetch_optional(db)
        .await
        .context("Failed to record transaction failure")
        .map_err(AppError::database)?;

        match claimed {
            Some(transaction) => {
                info!(
                    reference = %transaction.reference,
                    status = %transaction.status,
                    "Transaction finalized as failure"
                );
                Ok(FinalizeOutcome::Finalized(transaction))
            }
            None => {
                let existing = Self::find_by_gateway_reference(db, merchant_request_id).await?;
                if !existing.status().is_terminal() {
                    return Err(AppError::conflict(anyhow::anyhow!(
                        "Transaction is being finalized by a concurrent update"
                    )));
                }
                info!(
                    reference = %existing.reference,
                    status = %existing.status,
                    "Duplicate callback for terminal transaction ignored"
                );
                Ok(FinalizeOutcome::AlreadyFinal(existing))
            }
        }
    }
}

pub struct PaymentService;

impl PaymentService {
    /// Student-initiated payment. The business-rule guards run against a
    /// row-locked balance in the same database transaction as the payment
    /// insert and ledger credit, so two concurrent payments cannot both pass
    /// the same guard. The callback path does not use the guards since the
    /// gateway has already collected the money.
    #[instrument(skip(db, description))]
    pub async fn record_self_service_payment(
        db: &PgPool,
        student_id: Uuid,
        amount: f64,
        description: Option<String>,
    ) -> Result<Payment, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to open transaction")
            .map_err(AppError::database)?;

        let balance = FeeService::get_balance_for_update(&mut tx, student_id).await?;
        balance.check_self_service_payment(amount).map_err(|e| {
            let cause = anyhow::anyhow!("{}", e.message());
            match e {
                SelfPaymentError::NonPositiveAmount => AppError::bad_request(cause),
                SelfPaymentError::ExceedsCeiling | SelfPaymentError::ExceedsAmountDue => {
                    AppError::conflict(cause)
                }
            }
        })?;

        let payment =
            Self::insert_payment_row(&mut tx, student_id, amount, description.as_deref()).await?;
        FeeService::apply_payment(&mut tx, student_id, amount).await?;

        tx.commit()
            .await
            .context("Failed to commit payment")
            .map_err(AppError::database)?;

        Ok(payment)
    }

    /// Trusted recording path for payments taken outside the gateway flow.
    #[instrument(skip(db, dto))]
    pub async fn record_payment(db: &PgPool, dto: RecordPaymentDto) -> Result<Payment, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to open transaction")
            .map_err(AppError::database)?;

        let payment =
            Self::insert_payment_row(&mut tx, dto.student_id, dto.amount, dto.description.as_deref())
                .await?;
        FeeService::apply_payment(&mut tx, dto.student_id, dto.amount).await?;

        tx.commit()
            .await
            .context("Failed to commit payment")
            .map_err(AppError::database)?;

        Ok(payment)
    }

    async fn insert_payment_row(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        student_id: Uuid,
        amount: f64,
        description: Option<&str>,
    ) -> Result<Payment, AppError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "INSERT INTO payments (student_id, amount, description)
             VALUES ($1, $2, $3)
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(student_id)
        .bind(amount)
        .bind(description)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_foreign_key_violation() {
                    return AppError::not_found(anyhow::anyhow!("Student not found"));
                }
            }
            AppError::database(anyhow::Error::from(e))
        })?;

        Ok(payment)
    }

    #[instrument(skip(db))]
    pub async fn get_payments(db: &PgPool) -> Result<Vec<Payment>, AppError> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY payment_date DESC"
        ))
        .fetch_all(db)
        .await
        .context("Failed to fetch payments")
        .map_err(AppError::database)?;

        Ok(payments)
    }

    #[instrument(skip(db))]
    pub async fn get_payments_by_student(
        db: &PgPool,
        student_id: Uuid,
    ) -> Result<Vec<Payment>, AppError> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE student_id = $1
             ORDER BY payment_date DESC"
        ))
        .bind(student_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch student payments")
        .map_err(AppError::database)?;

        Ok(payments)
    }

    /// Deleting a payment reverses its ledger effect in the same database
    /// transaction. The linked transaction's payment_id is nulled by the
    /// foreign key's ON DELETE SET NULL.
    #[instrument(skip(db))]
    pub async fn delete_payment(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to open transaction")
            .map_err(AppError::database)?;

        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to fetch payment for deletion")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Payment not found")))?;

        FeeService::reverse_payment(&mut tx, payment.student_id, payment.amount).await?;

        sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete payment")
            .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit payment deletion")
            .map_err(AppError::database)?;

        Ok(())
    }
}
