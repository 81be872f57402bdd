//! Fault boundary: internal errors → stable external problem responses.
//!
//! Handlers return [`AppError`]; the boundary middleware at the outer edge
//! of the router is the sole place errors become wire responses. Full
//! internal detail is always logged before the external shape is emitted,
//! and unrecognized errors never leak detail to callers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::AppError;

/// Machine-readable error body (problem-details shape).
#[derive(Debug, Clone, Serialize)]
pub struct ProblemDetails {
    pub status: u16,
    pub title: String,
    pub detail: String,
    pub instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

/// Marker carrying the untranslated error from a handler response to the
/// boundary middleware.
#[derive(Clone)]
struct FaultMarker(Arc<AppError>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = status_for(&self);
        response.extensions_mut().insert(FaultMarker(Arc::new(self)));
        response
    }
}

/// Outer-edge middleware translating escaped errors into the external
/// problem shape. Infallible: any response without a fault marker passes
/// through untouched.
pub async fn fault_boundary(request: Request, next: Next) -> Response {
    let instance = request.uri().path().to_string();
    let response = next.run(request).await;

    let Some(FaultMarker(error)) = response.extensions().get::<FaultMarker>().cloned() else {
        return response;
    };

    let (status, problem) = translate(&error, &instance);
    (status, Json(problem)).into_response()
}

fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map an error to its external representation.
///
/// Logs the full internal detail first; the returned body carries only
/// what callers are meant to see.
pub fn translate(error: &AppError, instance: &str) -> (StatusCode, ProblemDetails) {
    tracing::error!(error = ?error, instance, "request failed");

    let status = status_for(error);
    let problem = match error {
        AppError::Validation(failures) => {
            let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for failure in failures {
                errors
                    .entry(failure.field.clone())
                    .or_default()
                    .push(failure.message.clone());
            }
            ProblemDetails {
                status: status.as_u16(),
                title: "Validation Error".to_string(),
                detail: "One or more validation errors occurred.".to_string(),
                instance: instance.to_string(),
                errors: Some(errors),
            }
        }
        AppError::NotFound(detail) => ProblemDetails {
            status: status.as_u16(),
            title: "Not Found".to_string(),
            detail: detail.clone(),
            instance: instance.to_string(),
            errors: None,
        },
        AppError::Unauthorized(_) => ProblemDetails {
            status: status.as_u16(),
            title: "Unauthorized".to_string(),
            detail: "You are not authorized to access this resource.".to_string(),
            instance: instance.to_string(),
            errors: None,
        },
        AppError::Conflict(detail) => ProblemDetails {
            status: status.as_u16(),
            title: "Conflict".to_string(),
            detail: detail.clone(),
            instance: instance.to_string(),
            errors: None,
        },
        AppError::Unexpected(_) => ProblemDetails {
            status: status.as_u16(),
            title: "Internal Server Error".to_string(),
            detail: "An unexpected error occurred.".to_string(),
            instance: instance.to_string(),
            errors: None,
        },
    };

    (status, problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;

    #[test]
    fn validation_maps_to_400_with_field_errors() {
        let error = AppError::Validation(vec![
            FieldError::new("name", "Name is required."),
            FieldError::new("name", "Name is too long."),
            FieldError::new("breed", "Breed is required."),
        ]);

        let (status, problem) = translate(&error, "/api/health/dogs");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(problem.title, "Validation Error");
        assert_eq!(problem.instance, "/api/health/dogs");
        let errors = problem.errors.unwrap();
        assert_eq!(errors["name"], vec!["Name is required.", "Name is too long."]);
        assert_eq!(errors["breed"], vec!["Breed is required."]);
    }

    #[test]
    fn recognized_kinds_map_to_their_status_codes() {
        let cases = [
            (AppError::not_found("no such dog"), StatusCode::NOT_FOUND),
            (AppError::unauthorized("bad token"), StatusCode::UNAUTHORIZED),
            (AppError::conflict("dog does not exist"), StatusCode::CONFLICT),
        ];

        for (error, expected) in cases {
            let (status, problem) = translate(&error, "/x");
            assert_eq!(status, expected);
            assert!(problem.errors.is_none());
        }
    }

    #[test]
    fn unexpected_does_not_leak_internal_detail() {
        let error = AppError::unexpected("connection string postgres://secret@db failed");
        let (status, problem) = translate(&error, "/x");

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(problem.detail, "An unexpected error occurred.");
        assert!(!problem.detail.contains("secret"));
    }

    #[test]
    fn unauthorized_detail_is_generic() {
        let error = AppError::unauthorized("jwt signature mismatch for key id 7");
        let (_, problem) = translate(&error, "/x");
        assert_eq!(problem.detail, "You are not authorized to access this resource.");
    }
}
