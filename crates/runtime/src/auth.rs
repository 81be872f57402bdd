//! Bearer authentication seam for module routes.
//!
//! The runtime owns the middleware and the request-scoped identity; which
//! credentials are acceptable is decided by whatever [`Authenticator`] the
//! identity module registers during boot. Protected modules resolve the
//! trait object from the service map and layer [`require_auth`] onto their
//! routes without knowing the token format.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Authenticated caller identity, inserted as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub email: String,
}

/// Validates a bearer credential into a [`CurrentUser`].
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, bearer: &str) -> AppResult<CurrentUser>;
}

/// Middleware guarding a route group behind bearer authentication.
pub async fn require_auth(
    State(auth): State<Arc<dyn Authenticator>>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match extract_bearer(request.headers()).and_then(|t| auth.authenticate(t)) {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}

fn extract_bearer(headers: &HeaderMap) -> AppResult<&str> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("missing authorization header"))?;

    let header = header
        .to_str()
        .map_err(|_| AppError::unauthorized("malformed authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("authorization header is not a bearer token"))?
        .trim();

    if token.is_empty() {
        return Err(AppError::unauthorized("empty bearer token"));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_a_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(extract_bearer(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn rejects_missing_and_malformed_headers() {
        assert!(extract_bearer(&HeaderMap::new()).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwdw=="),
        );
        assert!(extract_bearer(&headers).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer   "),
        );
        assert!(extract_bearer(&headers).is_err());
    }
}
