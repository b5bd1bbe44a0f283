use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use crate::modules::fees::model::{
    CreateFeeBalanceDto, FeeBalance, FeeBalanceWithStudent, UpdateFeeBalanceDto,
};
use crate::utils::errors::AppError;

const BALANCE_COLUMNS: &str =
    "id, student_id, amount_due, amount_paid, due_date, created_at, updated_at";

pub struct FeeService;

impl FeeService {
    #[instrument(skip(db, dto))]
    pub async fn create_balance(
        db: &PgPool,
        dto: CreateFeeBalanceDto,
    ) -> Result<FeeBalance, AppError> {
        let balance = sqlx::query_as::<_, FeeBalance>(&format!(
            "INSERT INTO fee_balances (student_id, amount_due, due_date)
             VALUES ($1, $2, $3)
             RETURNING {BALANCE_COLUMNS}"
        ))
        .bind(dto.student_id)
        .bind(dto.amount_due)
        .bind(dto.due_date)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict(anyhow::anyhow!(
                        "Student already has a fee balance"
                    ));
                }
                if db_err.is_foreign_key_violation() {
                    return AppError::not_found(anyhow::anyhow!("Student not found"));
                }
            }
            AppError::database(anyhow::Error::from(e))
        })?;

        Ok(balance)
    }

    #[instrument(skip(db))]
    pub async fn get_balances(db: &PgPool) -> Result<Vec<FeeBalanceWithStudent>, AppError> {
        let balances = sqlx::query_as::<_, FeeBalanceWithStudent>(
            "SELECT fb.id, fb.student_id,
                    s.first_name || ' ' || s.last_name AS student_name,
                    fb.amount_due, fb.amount_paid,
                    fb.amount_due - fb.amount_paid AS balance_remaining,
                    fb.due_date
             FROM fee_balances fb
             JOIN students s ON s.id = fb.student_id
             ORDER BY s.last_name, s.first_name",
        )
        .fetch_all(db)
        .await
        .context("Failed to fetch fee balances")
        .map_err(AppError::database)?;

        Ok(balances)
    }

    #[instrument(skip(db))]
    pub async fn get_balance_by_student(
        db: &PgPool,
        student_id: Uuid,
    ) -> Result<FeeBalance, AppError> {
        let balance = sqlx::query_as::<_, FeeBalance>(&format!(
            "SELECT {BALANCE_COLUMNS} FROM fee_balances WHERE student_id = $1"
        ))
        .bind(student_id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch fee balance")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Fee balance not found")))?;

        Ok(balance)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_balance(
        db: &PgPool,
        student_id: Uuid,
        dto: UpdateFeeBalanceDto,
    ) -> Result<FeeBalance, AppError> {
        let balance = sqlx::query_as::<_, FeeBalance>(&format!(
            "UPDATE fee_balances
             SET amount_due = COALESCE($1, amount_due),
                 due_date = COALESCE($2, due_date),
                 updated_at = NOW()
             WHERE student_id = $3
             RETURNING {BALANCE_COLUMNS}"
        ))
        .bind(dto.amount_due)
        .bind(dto.due_date)
        .bind(student_id)
        .fetch_optional(db)
        .await
        .context("Failed to update fee balance")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Fee balance not found")))?;

        Ok(balance)
    }

    #[instrument(skip(db))]
    pub async fn delete_balance(db: &PgPool, student_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM fee_balances WHERE student_id = $1")
            .bind(student_id)
            .execute(db)
            .await
            .context("Failed to delete fee balance")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Fee balance not found")));
        }

        Ok(())
    }

    /// Reads the balance inside the caller's transaction with a row lock.
    /// Guard checks made against this snapshot stay valid until the caller
    /// commits, so two concurrent payments cannot both pass the same guard.
    #[instrument(skip(tx))]
    pub async fn get_balance_for_update(
        tx: &mut Transaction<'_, Postgres>,
        student_id: Uuid,
    ) -> Result<FeeBalance, AppError> {
        let balance = sqlx::query_as::<_, FeeBalance>(&format!(
            "SELECT {BALANCE_COLUMNS} FROM fee_balances WHERE student_id = $1 FOR UPDATE"
        ))
        .bind(student_id)
        .fetch_optional(&mut **tx)
        .await
        .context("Failed to lock fee balance")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Fee balance not found")))?;

        Ok(balance)
    }

    /// Credits a payment against the student's balance. Runs inside the
    /// caller's transaction so the payment row and ledger move together.
    #[instrument(skip(tx))]
    pub async fn apply_payment(
        tx: &mut Transaction<'_, Postgres>,
        student_id: Uuid,
        amount: f64,
    ) -> Result<FeeBalance, AppError> {
        let balance = sqlx::query_as::<_, FeeBalance>(&format!(
            "UPDATE fee_balances
             SET amount_paid = amount_paid + $1, updated_at = NOW()
             WHERE student_id = $2
             RETURNING {BALANCE_COLUMNS}"
        ))
        .bind(amount)
        .bind(student_id)
        .fetch_optional(&mut **tx)
        .await
        .context("Failed to apply payment to fee balance")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Fee balance not found")))?;

        Ok(balance)
    }

    /// Debits a reversed payment. The conditional guard refuses to push
    /// `amount_paid` below zero, which would misstate the ledger.
    #[instrument(skip(tx))]
    pub async fn reverse_payment(
        tx: &mut Transaction<'_, Postgres>,
        student_id: Uuid,
        amount: f64,
    ) -> Result<FeeBalance, AppError> {
        let balance = sqlx::query_as::<_, FeeBalance>(&format!(
            "UPDATE fee_balances
             SET amount_paid = amount_paid - $1, updated_at = NOW()
             WHERE student_id = $2 AND amount_paid >= $1
             RETURNING {BALANCE_COLUMNS}"
        ))
        .bind(amount)
        .bind(student_id)
        .fetch_optional(&mut **tx)
        .await
        .context("Failed to reverse payment on fee balance")
        .map_err(AppError::database)?
        .ok_or_else(|| {
            AppError::conflict(anyhow::anyhow!(
                "Reversal would leave a negative amount paid"
            ))
        })?;

        Ok(balance)
    }
}
