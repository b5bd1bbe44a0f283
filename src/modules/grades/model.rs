use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct Grade {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_unit_id: Uuid,
    pub grade: String,
    pub phase: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Grade joined with the course the unit belongs to, for student-facing views.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct GradeWithCourse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_unit_id: Uuid,
    pub grade: String,
    pub phase: String,
    pub course_name: String,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct CreateGradeDto {
    pub student_id: Uuid,
    pub course_unit_id: Uuid,
    #[validate(length(min = 1, max = 5))]
    pub grade: String,
    #[validate(length(min = 1))]
    pub phase: String,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct UpdateGradeDto {
    #[validate(length(min = 1, max = 5))]
    pub grade: String,
}
