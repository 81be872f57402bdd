//! Login with a Google ID token.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use packhub_core::{Entity, UserId};
use packhub_runtime::{AppResult, Handle, Request, RuleSet, UnitOfWork};

use crate::google::GoogleTokenVerifier;
use crate::store::UserStore;
use crate::token::JwtTokens;
use crate::user::User;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginWithGoogle {
    pub id_token: String,
}

impl Request for LoginWithGoogle {
    type Response = LoginOutcome;
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub user_id: UserId,
    pub email: String,
    pub first_name: String,
    pub token: String,
    pub is_new_user: bool,
}

pub fn rules() -> RuleSet<LoginWithGoogle> {
    RuleSet::new().rule("id_token", |r: &LoginWithGoogle| {
        r.id_token
            .trim()
            .is_empty()
            .then(|| "Google ID token is required.".to_string())
    })
}

/// Verifies the Google token, upserts the user, and issues an access token.
pub struct LoginHandler {
    pub users: Arc<UserStore>,
    pub google: Arc<dyn GoogleTokenVerifier>,
    pub tokens: Arc<JwtTokens>,
    pub uow: UnitOfWork<UserStore>,
}

#[async_trait]
impl Handle<LoginWithGoogle> for LoginHandler {
    async fn handle(&self, request: LoginWithGoogle) -> AppResult<LoginOutcome> {
        let profile = self.google.verify(&request.id_token).await?;

        let (user, is_new_user) = match self.users.find_by_google_subject(&profile.subject_id) {
            Some(mut user) => {
                user.update_name(profile.first_name, profile.last_name);
                (user, false)
            }
            None => {
                let user = User::new(
                    UserId::new(),
                    profile.email,
                    profile.first_name,
                    profile.last_name,
                    profile.subject_id,
                )?;
                (user, true)
            }
        };

        self.uow.commit(vec![user.clone()]).await?;

        let token = self.tokens.issue(&user)?;

        Ok(LoginOutcome {
            user_id: *user.id(),
            email: user.email().to_string(),
            first_name: user.first_name().to_string(),
            token,
            is_new_user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::MockGoogleVerifier;
    use packhub_runtime::AppError;
    use packhub_runtime::SubscriberRegistry;

    fn handler() -> (Arc<UserStore>, LoginHandler) {
        let users = Arc::new(UserStore::new());
        let tokens = Arc::new(JwtTokens::new(b"test-secret"));
        let dispatcher = Arc::new(SubscriberRegistry::new().freeze());
        let handler = LoginHandler {
            users: Arc::clone(&users),
            google: Arc::new(MockGoogleVerifier),
            tokens,
            uow: UnitOfWork::new(Arc::clone(&users), dispatcher),
        };
        (users, handler)
    }

    #[tokio::test]
    async fn first_login_creates_the_user() {
        let (users, handler) = handler();

        let outcome = handler
            .handle(LoginWithGoogle {
                id_token: "valid_token".to_string(),
            })
            .await
            .unwrap();

        assert!(outcome.is_new_user);
        assert_eq!(outcome.email, "maja@example.com");
        assert!(!outcome.token.is_empty());
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn repeat_login_reuses_the_user() {
        let (users, handler) = handler();

        let first = handler
            .handle(LoginWithGoogle {
                id_token: "valid_token".to_string(),
            })
            .await
            .unwrap();
        let second = handler
            .handle(LoginWithGoogle {
                id_token: "valid_again".to_string(),
            })
            .await
            .unwrap();

        assert!(!second.is_new_user);
        assert_eq!(second.user_id, first.user_id);
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn invalid_google_token_is_unauthorized_and_persists_nothing() {
        let (users, handler) = handler();

        let err = handler
            .handle(LoginWithGoogle {
                id_token: "bogus".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(users.is_empty());
    }
}
