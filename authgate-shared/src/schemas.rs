/// Form validation schemas
///
/// Submitted forms arrive as untyped JSON. [`parse_form`] deserializes and
/// validates in one step; any failure (wrong shape, missing field, rule
/// violation) is reported as [`InvalidFields`], which the actions surface as
/// the generic "Invalid fields!" message.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// Minimum length of a sign-up password (characters)
pub const MIN_PASSWORD_LENGTH: u64 = 14;

/// Sign-up form
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SignUpForm {
    #[validate(email(message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 14, message = "Minimum 14 characters required"))]
    pub password: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: Option<String>,
}

/// Credentials sign-in form
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SignInForm {
    #[validate(email(message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    /// Where to go after signing in (relative path)
    #[serde(default, rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// One field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// A form that could not be parsed or failed validation
#[derive(Debug, Clone, thiserror::Error)]
#[error("Invalid fields")]
pub struct InvalidFields {
    pub errors: Vec<FieldError>,
}

impl From<ValidationErrors> for InvalidFields {
    fn from(errors: ValidationErrors) -> Self {
        let errors = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        Self { errors }
    }
}

/// Deserializes `values` into `T` and validates it
pub fn parse_form<T>(values: serde_json::Value) -> Result<T, InvalidFields>
where
    T: DeserializeOwned + Validate,
{
    let form: T = serde_json::from_value(values).map_err(|e| InvalidFields {
        errors: vec![FieldError {
            field: "form".to_string(),
            message: e.to_string(),
        }],
    })?;

    form.validate()?;
    Ok(form)
}
