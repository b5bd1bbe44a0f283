use anyhow::Context;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::grades::model::{CreateGradeDto, Grade, GradeWithCourse, UpdateGradeDto};
use crate::utils::errors::AppError;

const GRADE_COLUMNS: &str = "id, student_id, course_unit_id, grade, phase, created_at, updated_at";

pub struct GradeService;

impl GradeService {
    #[instrument(skip(db, dto))]
    pub async fn create_grade(db: &PgPool, dto: CreateGradeDto) -> Result<Grade, AppError> {
        let grade = sqlx::query_as::<_, Grade>(&format!(
            "INSERT INTO grades (student_id, course_unit_id, grade, phase)
             VALUES ($1, $2, $3, $4)
             RETURNING {GRADE_COLUMNS}"
        ))
        .bind(dto.student_id)
        .bind(dto.course_unit_id)
        .bind(&dto.grade)
        .bind(&dto.phase)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_foreign_key_violation() {
                    return AppError::not_found(anyhow::anyhow!("Student or unit not found"));
                }
            }
            AppError::database(anyhow::Error::from(e))
        })?;

        Ok(grade)
    }

    #[instrument(skip(db))]
    pub async fn get_grades(db: &PgPool) -> Result<Vec<Grade>, AppError> {
        let grades = sqlx::query_as::<_, Grade>(&format!(
            "SELECT {GRADE_COLUMNS} FROM grades ORDER BY created_at"
        ))
        .fetch_all(db)
        .await
        .context("Failed to fetch grades")
        .map_err(AppError::database)?;

        Ok(grades)
    }

    #[instrument(skip(db))]
    pub async fn get_grades_by_student(
        db: &PgPool,
        student_id: Uuid,
    ) -> Result<Vec<GradeWithCourse>, AppError> {
        let grades = sqlx::query_as::<_, GradeWithCourse>(
            "SELECT g.id, g.student_id, g.course_unit_id, g.grade, g.phase, c.name AS course_name
             FROM grades g
             JOIN course_units cu ON cu.id = g.course_unit_id
             JOIN courses c ON c.id = cu.course_id
             WHERE g.student_id = $1
             ORDER BY g.created_at",
        )
        .bind(student_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch student grades")
        .map_err(AppError::database)?;

        Ok(grades)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_grade(
        db: &PgPool,
        id: Uuid,
        dto: UpdateGradeDto,
    ) -> Result<Grade, AppError> {
        let grade = sqlx::query_as::<_, Grade>(&format!(
            "UPDATE grades SET grade = $1, updated_at = NOW() WHERE id = $2
             RETURNING {GRADE_COLUMNS}"
        ))
        .bind(&dto.grade)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to update grade")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Grade not found")))?;

        Ok(grade)
    }

    #[instrument(skip(db))]
    pub async fn delete_grade(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM grades WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete grade")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Grade not found")));
        }

        Ok(())
    }
}
