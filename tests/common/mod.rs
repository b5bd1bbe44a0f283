//! Shared fixtures for database-backed tests.

use shule_api::utils::password::hash_password;
use sqlx::PgPool;
use uuid::Uuid;

#[allow(dead_code)]
pub struct TestStudent {
    pub student_id: Uuid,
    pub user_id: Uuid,
}

/// Inserts a user, a student profile and a fee balance in one go.
pub async fn create_test_student(pool: &PgPool, amount_due: f64, amount_paid: f64) -> TestStudent {
    let suffix = Uuid::new_v4().simple().to_string();
    let password = hash_password("studentpass123").unwrap();

    let (user_id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO users (username, email, password, role)
         VALUES ($1, $2, $3, 'student') RETURNING id",
    )
    .bind(format!("student_{suffix}"))
    .bind(format!("student_{suffix}@example.com"))
    .bind(&password)
    .fetch_one(pool)
    .await
    .unwrap();

    let (student_id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO students (user_id, first_name, last_name, date_of_birth, current_phase)
         VALUES ($1, 'Test', 'Student', '2005-01-15', 'Phase 1') RETURNING id",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO fee_balances (student_id, amount_due, amount_paid) VALUES ($1, $2, $3)",
    )
    .bind(student_id)
    .bind(amount_due)
    .bind(amount_paid)
    .execute(pool)
    .await
    .unwrap();

    TestStudent {
        student_id,
        user_id,
    }
}

pub async fn amount_paid(pool: &PgPool, student_id: Uuid) -> f64 {
    let (paid,): (f64,) =
        sqlx::query_as("SELECT amount_paid FROM fee_balances WHERE student_id = $1")
            .bind(student_id)
            .fetch_one(pool)
            .await
            .unwrap();
    paid
}

pub async fn payment_count(pool: &PgPool, student_id: Uuid) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM payments WHERE student_id = $1")
        .bind(student_id)
        .fetch_one(pool)
        .await
        .unwrap();
    count
}
