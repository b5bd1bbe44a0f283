use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub fee: f64,
    pub duration: String,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct Unit {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

/// A unit taught in a course during a given phase.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct CourseUnit {
    pub id: Uuid,
    pub course_id: Uuid,
    pub unit_id: Uuid,
    pub phase: String,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0.0))]
    pub fee: f64,
    #[validate(length(min = 1))]
    pub duration: String,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct CreateUnitDto {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub description: String,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct AssignUnitDto {
    pub unit_id: Uuid,
    #[validate(length(min = 1))]
    pub phase: String,
}
