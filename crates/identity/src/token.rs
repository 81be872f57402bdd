//! JWT issuance and verification (HS256).

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use packhub_core::Entity;
use packhub_runtime::{AppError, AppResult, Authenticator, CurrentUser};

use crate::user::User;

const ISSUER: &str = "packhub-api";
const AUDIENCE: &str = "packhub-app";
const TOKEN_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub given_name: String,
    pub gsub: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and validates Packhub access tokens with one shared secret.
pub struct JwtTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtTokens {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a signed access token for a user.
    pub fn issue(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id().to_string(),
            email: user.email().to_string(),
            given_name: user.first_name().to_string(),
            gsub: user.google_subject_id().to_string(),
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::unexpected(format!("failed to sign token: {e}")))
    }

    /// Validate a token's signature, issuer, audience, and expiry.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::unauthorized(format!("token rejected: {e}")))
    }
}

impl Authenticator for JwtTokens {
    fn authenticate(&self, bearer: &str) -> AppResult<CurrentUser> {
        let claims = self.verify(bearer)?;
        let user_id: Uuid = claims
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("invalid subject claim"))?;

        Ok(CurrentUser {
            user_id,
            email: claims.email,
        })
    }
}

impl core::fmt::Debug for JwtTokens {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JwtTokens").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packhub_core::UserId;

    fn user() -> User {
        User::new(
            UserId::new(),
            "maja@example.com",
            "Maja",
            "Novak",
            "google_123456789",
        )
        .unwrap()
    }

    #[test]
    fn issued_tokens_verify_and_authenticate() {
        let tokens = JwtTokens::new(b"test-secret");
        let user = user();

        let token = tokens.issue(&user).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, user.id().to_string());
        assert_eq!(claims.email, "maja@example.com");

        let current = tokens.authenticate(&token).unwrap();
        assert_eq!(current.user_id, *user.id().as_uuid());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = JwtTokens::new(b"secret-a");
        let verifier = JwtTokens::new(b"secret-b");

        let token = issuer.issue(&user()).unwrap();
        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn garbage_is_rejected() {
        let tokens = JwtTokens::new(b"test-secret");
        assert!(tokens.authenticate("not.a.jwt").is_err());
    }
}
