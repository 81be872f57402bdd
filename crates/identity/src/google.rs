//! Google ID-token verification boundary.

use async_trait::async_trait;

use packhub_runtime::{AppError, AppResult};

/// Profile extracted from a verified Google ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleProfile {
    pub subject_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Verifies a Google ID token and returns the caller's profile.
#[async_trait]
pub trait GoogleTokenVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> AppResult<GoogleProfile>;
}

/// Development/test verifier: any token starting with `valid_` resolves to
/// a fixed profile, everything else is rejected.
#[derive(Debug, Default)]
pub struct MockGoogleVerifier;

#[async_trait]
impl GoogleTokenVerifier for MockGoogleVerifier {
    async fn verify(&self, id_token: &str) -> AppResult<GoogleProfile> {
        if id_token.starts_with("valid_") {
            return Ok(GoogleProfile {
                subject_id: "google_123456789".to_string(),
                email: "maja@example.com".to_string(),
                first_name: "Maja".to_string(),
                last_name: "Novak".to_string(),
            });
        }

        Err(AppError::unauthorized("google token is invalid"))
    }
}
