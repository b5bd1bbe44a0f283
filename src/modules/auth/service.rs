use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::utils::errors::AppError;
use crate::utils::jwt::{create_access_token, create_refresh_token, verify_token};
use crate::utils::password::verify_password;

use super::model::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse};

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        #[derive(sqlx::FromRow)]
        struct UserWithPassword {
            id: Uuid,
            email: String,
            password: String,
            role: String,
        }

        let user = sqlx::query_as::<_, UserWithPassword>(
            "SELECT id, email, password, role FROM users WHERE email = $1",
        )
        .bind(&dto.email)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("Invalid email or password")))?;

        let is_valid = verify_password(&dto.password, &user.password)?;

        if !is_valid {
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "Invalid email or password"
            )));
        }

        let role = user.role.parse()?;
        let access_token = create_access_token(user.id, &user.email, &role, jwt_config)?;
        let refresh_token = create_refresh_token(user.id, &user.email, &role, jwt_config)?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            role: user.role,
        })
    }

    #[instrument(skip(dto))]
    pub async fn refresh_token(
        dto: RefreshRequest,
        jwt_config: &JwtConfig,
    ) -> Result<RefreshResponse, AppError> {
        let claims = verify_token(&dto.refresh_token, jwt_config)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid user ID in token")))?;
        let role = claims.role.parse()?;

        let access_token = create_access_token(user_id, &claims.email, &role, jwt_config)?;

        Ok(RefreshResponse { access_token })
    }
}
