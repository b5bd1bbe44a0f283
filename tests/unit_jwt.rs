use shule_api::config::jwt::JwtConfig;
use shule_api::modules::users::model::UserRole;
use shule_api::utils::jwt::{create_access_token, create_refresh_token, verify_token};
use uuid::Uuid;

fn get_test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
    }
}

#[test]
fn test_create_access_token_success() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();
    let email = "test@example.com";
    let role = UserRole::Student;

    let result = create_access_token(user_id, email, &role, &jwt_config);

    assert!(result.is_ok());
    let token = result.unwrap();
    assert!(!token.is_empty());
}

#[test]
fn test_create_access_token_all_roles() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();
    let email = "test@example.com";

    for role in [UserRole::Admin, UserRole::Student] {
        let result = create_access_token(user_id, email, &role, &jwt_config);
        assert!(result.is_ok());
    }
}

#[test]
fn test_verify_token_success() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();
    let email = "test@example.com";
    let role = UserRole::Student;

    let token = create_access_token(user_id, email, &role, &jwt_config).unwrap();
    let result = verify_token(&token, &jwt_config);

    assert!(result.is_ok());
    let claims = result.unwrap();
    assert_eq!(claims.email, email);
    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.role, "student");
}

#[test]
fn test_verify_refresh_token_success() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();
    let role = UserRole::Admin;

    let token = create_refresh_token(user_id, "admin@example.com", &role, &jwt_config).unwrap();
    let claims = verify_token(&token, &jwt_config).unwrap();

    assert_eq!(claims.role, "admin");
    assert_eq!(claims.sub, user_id.to_string());
}

#[test]
fn test_verify_token_invalid() {
    let jwt_config = get_test_jwt_config();
    let invalid_token = "invalid.token.here";

    let result = verify_token(invalid_token, &jwt_config);

    assert!(result.is_err());
}

#[test]
fn test_verify_token_wrong_secret() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();
    let email = "test@example.com";
    let role = UserRole::Student;

    let token = create_access_token(user_id, email, &role, &jwt_config).unwrap();

    let wrong_config = JwtConfig {
        secret: "a_completely_different_secret".to_string(),
        ..get_test_jwt_config()
    };

    let result = verify_token(&token, &wrong_config);

    assert!(result.is_err());
}
