//! Role-based authorization middleware.
//!
//! The role check is a single comparison against the `role` claim carried by
//! the access token, applied at the router boundary with
//! `axum::middleware::from_fn_with_state` rather than inside handlers.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::middleware::auth::AuthUser;
use crate::modules::users::model::UserRole;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Middleware function that checks the authenticated user's role against an
/// allow-list.
pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: Vec<UserRole>,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;
    let user_role = auth_user.role()?;

    if !allowed_roles.contains(&user_role) {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Access denied. Required roles: {:?}, but user has role: {:?}",
            allowed_roles,
            user_role
        )));
    }

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

/// Layer helper for admin-only routes.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, vec![UserRole::Admin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Check that the caller either is an admin or owns the given student record.
pub fn check_student_access(
    auth_user: &AuthUser,
    student_user_id: uuid::Uuid,
) -> Result<(), AppError> {
    if auth_user.is_admin() {
        return Ok(());
    }

    if auth_user.user_id()? != student_user_id {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Access denied. You may only access your own records."
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::model::Claims;
    use uuid::Uuid;

    fn claims_with_role(user_id: Uuid, role: &str) -> Claims {
        Claims {
            sub: user_id.to_string(),
            email: "test@example.com".to_string(),
            role: role.to_string(),
            exp: 9999999999,
            iat: 1234567890,
        }
    }

    #[test]
    fn test_admin_can_access_any_student() {
        let auth_user = AuthUser(claims_with_role(Uuid::new_v4(), "admin"));
        assert!(check_student_access(&auth_user, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_student_can_access_own_record() {
        let user_id = Uuid::new_v4();
        let auth_user = AuthUser(claims_with_role(user_id, "student"));
        assert!(check_student_access(&auth_user, user_id).is_ok());
    }

    #[test]
    fn test_student_cannot_access_other_record() {
        let auth_user = AuthUser(claims_with_role(Uuid::new_v4(), "student"));
        let err = check_student_access(&auth_user, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_invalid_role_claim_is_unauthorized() {
        let auth_user = AuthUser(claims_with_role(Uuid::new_v4(), "superuser"));
        let err = auth_user.role().unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_unknown_role_is_not_admin() {
        let auth_user = AuthUser(claims_with_role(Uuid::new_v4(), "superuser"));
        assert!(!auth_user.is_admin());
    }
}
