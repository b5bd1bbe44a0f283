use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::utils::errors::AppError;

/// Flattens `validator` output into sorted "field: message" lines so the
/// response body is deterministic regardless of map iteration order.
fn collect_messages(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| match &error.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: failed {} validation", error.code),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

/// JSON extractor that also runs `validator` rules on the payload.
///
/// A body that cannot be deserialized is a 400; one that parses but breaks a
/// validation rule is a 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                JsonRejection::JsonDataError(e) => AppError::bad_request(anyhow!(
                    "Request body does not match the expected shape: {}",
                    e.body_text()
                )),
                JsonRejection::JsonSyntaxError(_) => {
                    AppError::bad_request(anyhow!("Request body is not valid JSON"))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    AppError::bad_request(anyhow!("Expected 'Content-Type: application/json'"))
                }
                other => {
                    AppError::bad_request(anyhow!("Invalid request body: {}", other.body_text()))
                }
            })?;

        value
            .validate()
            .map_err(|errors| AppError::unprocessable(anyhow!("{}", collect_messages(&errors))))?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Validate)]
    struct SignupDto {
        #[validate(email)]
        email: String,
        #[validate(length(min = 8, message = "must be at least 8 characters"))]
        password: String,
    }

    #[test]
    fn test_messages_carry_field_names_and_are_sorted() {
        let dto = SignupDto {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };

        let errors = dto.validate().unwrap_err();
        let rendered = collect_messages(&errors);

        assert_eq!(
            rendered,
            "email: failed email validation; password: must be at least 8 characters"
        );
    }

    #[test]
    fn test_valid_payload_has_no_messages() {
        let dto = SignupDto {
            email: "user@example.com".to_string(),
            password: "longenough".to_string(),
        };

        assert!(dto.validate().is_ok());
    }
}
