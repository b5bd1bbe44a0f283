use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::modules::fees::model::FeeBalance;
use crate::modules::grades::model::GradeWithCourse;

/// A student profile. Login credentials live on the linked `users` row.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct Student {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: chrono::NaiveDate,
    pub course_id: Option<Uuid>,
    pub current_phase: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a student together with their user account.
#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct CreateStudentDto {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    pub date_of_birth: chrono::NaiveDate,
    pub course_id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub current_phase: String,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct UpdateStudentDto {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub course_id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub current_phase: Option<String>,
}

/// Profile fields a student may edit about themselves.
#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
}

/// Aggregated view returned by the student dashboard endpoint.
#[derive(Serialize, Debug, ToSchema)]
pub struct StudentDashboard {
    pub student: Student,
    pub grades: Vec<GradeWithCourse>,
    pub fee_balance: Option<FeeBalance>,
    pub current_phase: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct PhaseResponse {
    pub current_phase: String,
}
