use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse};
use crate::modules::courses::model::{
    AssignUnitDto, Course, CourseUnit, CreateCourseDto, CreateUnitDto, Unit,
};
use crate::modules::fees::model::{
    CreateFeeBalanceDto, FeeBalance, FeeBalanceWithStudent, UpdateFeeBalanceDto,
};
use crate::modules::grades::model::{CreateGradeDto, Grade, GradeWithCourse, UpdateGradeDto};
use crate::modules::payments::controller::CallbackAck;
use crate::modules::payments::model::{
    CallbackBody, CallbackItem, CallbackMetadata, InitiatePaymentResponse, NewMpesaPaymentDto,
    Payment, RecordPaymentDto, SelfServicePaymentDto, StkCallback, StkCallbackEnvelope,
    Transaction,
};
use crate::modules::students::model::{
    CreateStudentDto, PhaseResponse, Student, StudentDashboard, UpdateProfileDto, UpdateStudentDto,
};
use crate::modules::users::model::{User, UserRole};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::refresh_token,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::delete_user,
        crate::modules::students::controller::create_student,
        crate::modules::students::controller::get_students,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::update_student,
        crate::modules::students::controller::delete_student,
        crate::modules::students::controller::get_dashboard,
        crate::modules::students::controller::get_own_grades,
        crate::modules::students::controller::get_own_fees,
        crate::modules::students::controller::get_phase,
        crate::modules::students::controller::update_profile,
        crate::modules::students::controller::get_own_payments,
        crate::modules::students::controller::record_self_payment,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::get_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::create_unit,
        crate::modules::courses::controller::assign_unit,
        crate::modules::courses::controller::get_course_units,
        crate::modules::grades::controller::create_grade,
        crate::modules::grades::controller::get_grades,
        crate::modules::grades::controller::get_student_grades,
        crate::modules::grades::controller::update_grade,
        crate::modules::grades::controller::delete_grade,
        crate::modules::fees::controller::create_balance,
        crate::modules::fees::controller::get_balances,
        crate::modules::fees::controller::get_balance,
        crate::modules::fees::controller::update_balance,
        crate::modules::fees::controller::delete_balance,
        crate::modules::payments::controller::new_mpesa_payment,
        crate::modules::payments::controller::confirm_payment,
        crate::modules::payments::controller::mpesa_callback,
        crate::modules::payments::controller::record_payment,
        crate::modules::payments::controller::get_payments,
        crate::modules::payments::controller::delete_payment,
    ),
    components(
        schemas(
            User,
            UserRole,
            LoginRequest,
            LoginResponse,
            RefreshRequest,
            RefreshResponse,
            ErrorResponse,
            Student,
            CreateStudentDto,
            UpdateStudentDto,
            UpdateProfileDto,
            StudentDashboard,
            PhaseResponse,
            Course,
            Unit,
            CourseUnit,
            CreateCourseDto,
            CreateUnitDto,
            AssignUnitDto,
            Grade,
            GradeWithCourse,
            CreateGradeDto,
            UpdateGradeDto,
            FeeBalance,
            FeeBalanceWithStudent,
            CreateFeeBalanceDto,
            UpdateFeeBalanceDto,
            Transaction,
            Payment,
            NewMpesaPaymentDto,
            SelfServicePaymentDto,
            RecordPaymentDto,
            InitiatePaymentResponse,
            StkCallbackEnvelope,
            CallbackBody,
            StkCallback,
            CallbackMetadata,
            CallbackItem,
            CallbackAck,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login and token refresh"),
        (name = "Users", description = "User account management"),
        (name = "Students", description = "Student records and self-service"),
        (name = "Courses", description = "Courses and units"),
        (name = "Grades", description = "Grade recording"),
        (name = "Fees", description = "Fee balance administration"),
        (name = "Payments", description = "M-Pesa payments and the transaction ledger")
    ),
    info(
        title = "Shule API",
        version = "0.1.0",
        description = "School administration REST API with M-Pesa fee payment reconciliation."
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
