//! Application error model: the closed taxonomy the fault boundary
//! translates.

use serde::Serialize;
use thiserror::Error;

/// Result type used across the application layer.
pub type AppResult<T> = Result<T, AppError>;

/// A single failed validation rule: which field, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application-level error.
///
/// Keep variants deterministic and business-meaningful; transport and
/// storage concerns map into `Unexpected`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    /// One or more request validation rules failed (ordered field/message pairs).
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// A requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller is not authenticated or the credential is invalid.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A business rule conflict (e.g. referenced parent missing at write time).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Anything the taxonomy does not recognize. Never shown to callers verbatim.
    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }

    /// Single-field validation failure.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_wraps_a_single_field_error() {
        let err = AppError::invalid("name", "Name is required.");
        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "name");
                assert_eq!(errors[0].message, "Name is required.");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
