use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Upper bound on the lifetime amount a single balance may record. Guards the
/// self-service payment path against fat-finger entries.
pub const MAX_AMOUNT_PAID: f64 = 200_000.0;

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct FeeBalance {
    pub id: Uuid,
    pub student_id: Uuid,
    pub amount_due: f64,
    pub amount_paid: f64,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeeBalance {
    pub fn remaining(&self) -> f64 {
        self.amount_due - self.amount_paid
    }

    /// Validates a student-initiated payment against this balance. Gateway
    /// callbacks skip these checks since the money has already changed hands.
    pub fn check_self_service_payment(&self, amount: f64) -> Result<(), SelfPaymentError> {
        if amount <= 0.0 {
            return Err(SelfPaymentError::NonPositiveAmount);
        }
        if self.amount_paid + amount > MAX_AMOUNT_PAID {
            return Err(SelfPaymentError::ExceedsCeiling);
        }
        if amount > self.remaining() {
            return Err(SelfPaymentError::ExceedsAmountDue);
        }
        Ok(())
    }
}

/// Why a self-service payment was rejected before touching the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfPaymentError {
    NonPositiveAmount,
    ExceedsCeiling,
    ExceedsAmountDue,
}

impl SelfPaymentError {
    pub fn message(&self) -> &'static str {
        match self {
            SelfPaymentError::NonPositiveAmount => "Payment amount must be greater than zero",
            SelfPaymentError::ExceedsCeiling => "Payment would exceed the maximum recordable total",
            SelfPaymentError::ExceedsAmountDue => "Payment exceeds the amount due",
        }
    }
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct CreateFeeBalanceDto {
    pub student_id: Uuid,
    #[validate(range(min = 0.0))]
    pub amount_due: f64,
    pub due_date: Option<NaiveDate>,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct UpdateFeeBalanceDto {
    #[validate(range(min = 0.0))]
    pub amount_due: Option<f64>,
    pub due_date: Option<NaiveDate>,
}

/// Admin listing row: balance joined with the student it belongs to.
#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct FeeBalanceWithStudent {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub amount_due: f64,
    pub amount_paid: f64,
    pub balance_remaining: f64,
    pub due_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn balance(amount_due: f64, amount_paid: f64) -> FeeBalance {
        FeeBalance {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            amount_due,
            amount_paid,
            due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn accepts_payment_within_remaining_balance() {
        let b = balance(50_000.0, 10_000.0);
        assert!(b.check_self_service_payment(5_000.0).is_ok());
    }

    #[test]
    fn accepts_payment_that_exactly_clears_the_balance() {
        let b = balance(50_000.0, 10_000.0);
        assert!(b.check_self_service_payment(40_000.0).is_ok());
    }

    #[test]
    fn rejects_zero_amount() {
        let b = balance(50_000.0, 0.0);
        assert_eq!(
            b.check_self_service_payment(0.0),
            Err(SelfPaymentError::NonPositiveAmount)
        );
    }

    #[test]
    fn rejects_negative_amount() {
        let b = balance(50_000.0, 0.0);
        assert_eq!(
            b.check_self_service_payment(-100.0),
            Err(SelfPaymentError::NonPositiveAmount)
        );
    }

    #[test]
    fn rejects_payment_exceeding_amount_due() {
        let b = balance(50_000.0, 45_000.0);
        assert_eq!(
            b.check_self_service_payment(10_000.0),
            Err(SelfPaymentError::ExceedsAmountDue)
        );
    }

    #[test]
    fn rejects_payment_breaching_the_ceiling() {
        let b = balance(500_000.0, 195_000.0);
        assert_eq!(
            b.check_self_service_payment(10_000.0),
            Err(SelfPaymentError::ExceedsCeiling)
        );
    }

    #[test]
    fn remaining_is_due_minus_paid() {
        let b = balance(30_000.0, 12_500.0);
        assert_eq!(b.remaining(), 17_500.0);
    }
}
