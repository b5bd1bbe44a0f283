use anyhow::Context;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::fees::model::FeeBalance;
use crate::modules::grades::model::GradeWithCourse;
use crate::modules::students::model::{
    CreateStudentDto, Student, StudentDashboard, UpdateProfileDto, UpdateStudentDto,
};
use crate::modules::users::model::UserRole;
use crate::utils::errors::AppError;
use crate::utils::password::hash_password;

const STUDENT_COLUMNS: &str =
    "id, user_id, first_name, last_name, date_of_birth, course_id, current_phase, created_at, updated_at";

pub struct StudentService;

impl StudentService {
    /// Creates the user account and the student profile in one database
    /// transaction; a failure in either insert rolls back both.
    #[instrument(skip(db, dto))]
    pub async fn create_student(db: &PgPool, dto: CreateStudentDto) -> Result<Student, AppError> {
        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = $1 OR username = $2")
                .bind(&dto.email)
                .bind(&dto.username)
                .fetch_optional(db)
                .await
                .context("Failed to check for existing user")
                .map_err(AppError::database)?;

        if existing.is_some() {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Username or email already exists"
            )));
        }

        let hashed_password = hash_password(&dto.password)?;

        let mut tx = db.begin().await.map_err(AppError::database)?;

        let (user_id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO users (username, email, password, role) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&dto.username)
        .bind(&dto.email)
        .bind(&hashed_password)
        .bind(UserRole::Student.as_str())
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create user")
        .map_err(AppError::database)?;

        let student = sqlx::query_as::<_, Student>(&format!(
            "INSERT INTO students (user_id, first_name, last_name, date_of_birth, course_id, current_phase)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(dto.date_of_birth)
        .bind(dto.course_id)
        .bind(&dto.current_phase)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create student")
        .map_err(AppError::database)?;

        tx.commit().await.map_err(AppError::database)?;

        Ok(student)
    }

    #[instrument(skip(db))]
    pub async fn get_student(db: &PgPool, id: Uuid) -> Result<Student, AppError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch student by ID")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))?;

        Ok(student)
    }

    #[instrument(skip(db))]
    pub async fn get_students(db: &PgPool) -> Result<Vec<Student>, AppError> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY last_name, first_name"
        ))
        .fetch_all(db)
        .await
        .context("Failed to fetch students")
        .map_err(AppError::database)?;

        Ok(students)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_student(
        db: &PgPool,
        id: Uuid,
        dto: UpdateStudentDto,
    ) -> Result<Student, AppError> {
        let existing = Self::get_student(db, id).await?;

        let student = sqlx::query_as::<_, Student>(&format!(
            "UPDATE students
             SET first_name = $1, last_name = $2, date_of_birth = $3, course_id = $4,
                 current_phase = $5, updated_at = NOW()
             WHERE id = $6
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(dto.first_name.unwrap_or(existing.first_name))
        .bind(dto.last_name.unwrap_or(existing.last_name))
        .bind(dto.date_of_birth.unwrap_or(existing.date_of_birth))
        .bind(dto.course_id.or(existing.course_id))
        .bind(dto.current_phase.unwrap_or(existing.current_phase))
        .bind(id)
        .fetch_one(db)
        .await
        .context("Failed to update student")
        .map_err(AppError::database)?;

        Ok(student)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        dto: UpdateProfileDto,
    ) -> Result<Student, AppError> {
        let existing = Self::get_student(db, id).await?;

        let student = sqlx::query_as::<_, Student>(&format!(
            "UPDATE students
             SET first_name = $1, last_name = $2, date_of_birth = $3, updated_at = NOW()
             WHERE id = $4
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(dto.first_name.unwrap_or(existing.first_name))
        .bind(dto.last_name.unwrap_or(existing.last_name))
        .bind(dto.date_of_birth.unwrap_or(existing.date_of_birth))
        .bind(id)
        .fetch_one(db)
        .await
        .context("Failed to update student profile")
        .map_err(AppError::database)?;

        Ok(student)
    }

    /// Removes the student's user account; the student row and its dependents
    /// go with it via cascading deletes.
    #[instrument(skip(db))]
    pub async fn delete_student(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let student = Self::get_student(db, id).await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(student.user_id)
            .execute(db)
            .await
            .context("Failed to delete student")
            .map_err(AppError::database)?;

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_dashboard(db: &PgPool, id: Uuid) -> Result<StudentDashboard, AppError> {
        let student = Self::get_student(db, id).await?;

        let grades = sqlx::query_as::<_, GradeWithCourse>(
            "SELECT g.id, g.student_id, g.course_unit_id, g.grade, g.phase, c.name AS course_name
             FROM grades g
             JOIN course_units cu ON cu.id = g.course_unit_id
             JOIN courses c ON c.id = cu.course_id
             WHERE g.student_id = $1
             ORDER BY g.created_at",
        )
        .bind(id)
        .fetch_all(db)
        .await
        .context("Failed to fetch grades for dashboard")
        .map_err(AppError::database)?;

        let fee_balance = sqlx::query_as::<_, FeeBalance>(
            "SELECT id, student_id, amount_due, amount_paid, due_date, created_at, updated_at
             FROM fee_balances WHERE student_id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch fee balance for dashboard")
        .map_err(AppError::database)?;

        let current_phase = student.current_phase.clone();

        Ok(StudentDashboard {
            student,
            grades,
            fee_balance,
            current_phase,
        })
    }
}
