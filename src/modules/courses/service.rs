use anyhow::Context;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::courses::model::{
    AssignUnitDto, Course, CourseUnit, CreateCourseDto, CreateUnitDto, Unit,
};
use crate::utils::errors::AppError;

pub struct CourseService;

impl CourseService {
    #[instrument(skip(db, dto))]
    pub async fn create_course(db: &PgPool, dto: CreateCourseDto) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(
            "INSERT INTO courses (name, fee, duration) VALUES ($1, $2, $3)
             RETURNING id, name, fee, duration",
        )
        .bind(&dto.name)
        .bind(dto.fee)
        .bind(&dto.duration)
        .fetch_one(db)
        .await
        .context("Failed to create course")
        .map_err(AppError::database)?;

        Ok(course)
    }

    #[instrument(skip(db))]
    pub async fn get_courses(db: &PgPool) -> Result<Vec<Course>, AppError> {
        let courses =
            sqlx::query_as::<_, Course>("SELECT id, name, fee, duration FROM courses ORDER BY name")
                .fetch_all(db)
                .await
                .context("Failed to fetch courses")
                .map_err(AppError::database)?;

        Ok(courses)
    }

    #[instrument(skip(db))]
    pub async fn get_course(db: &PgPool, id: Uuid) -> Result<Course, AppError> {
        let course =
            sqlx::query_as::<_, Course>("SELECT id, name, fee, duration FROM courses WHERE id = $1")
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to fetch course")
                .map_err(AppError::database)?
                .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))?;

        Ok(course)
    }

    #[instrument(skip(db, dto))]
    pub async fn create_unit(db: &PgPool, dto: CreateUnitDto) -> Result<Unit, AppError> {
        let unit = sqlx::query_as::<_, Unit>(
            "INSERT INTO units (name, description) VALUES ($1, $2)
             RETURNING id, name, description",
        )
        .bind(&dto.name)
        .bind(&dto.description)
        .fetch_one(db)
        .await
        .context("Failed to create unit")
        .map_err(AppError::database)?;

        Ok(unit)
    }

    #[instrument(skip(db, dto))]
    pub async fn assign_unit(
        db: &PgPool,
        course_id: Uuid,
        dto: AssignUnitDto,
    ) -> Result<CourseUnit, AppError> {
        Self::get_course(db, course_id).await?;

        let course_unit = sqlx::query_as::<_, CourseUnit>(
            "INSERT INTO course_units (course_id, unit_id, phase) VALUES ($1, $2, $3)
             RETURNING id, course_id, unit_id, phase",
        )
        .bind(course_id)
        .bind(dto.unit_id)
        .bind(&dto.phase)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict(anyhow::anyhow!(
                        "Unit already assigned to this course for that phase"
                    ));
                }
                if db_err.is_foreign_key_violation() {
                    return AppError::not_found(anyhow::anyhow!("Unit not found"));
                }
            }
            AppError::database(anyhow::Error::from(e))
        })?;

        Ok(course_unit)
    }

    #[instrument(skip(db))]
    pub async fn get_course_units(db: &PgPool, course_id: Uuid) -> Result<Vec<CourseUnit>, AppError> {
        let units = sqlx::query_as::<_, CourseUnit>(
            "SELECT id, course_id, unit_id, phase FROM course_units WHERE course_id = $1",
        )
        .bind(course_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch course units")
        .map_err(AppError::database)?;

        Ok(units)
    }
}
