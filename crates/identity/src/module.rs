//! Identity module wiring.

use std::sync::Arc;

use async_trait::async_trait;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use serde::Deserialize;

use packhub_runtime::{
    AppConfig, AppError, Authenticator, BootError, EventDispatcher, Module, Pipeline,
    ServiceMap, UnitOfWork, auth::require_auth,
};

use crate::google::{GoogleTokenVerifier, MockGoogleVerifier};
use crate::login::{self, LoginOutcome, LoginWithGoogle};
use crate::store::UserStore;
use crate::token::JwtTokens;

pub struct IdentityModule;

#[async_trait]
impl Module for IdentityModule {
    fn name(&self) -> &'static str {
        "identity"
    }

    async fn register_services(
        &self,
        services: &mut ServiceMap,
        config: &AppConfig,
    ) -> Result<(), BootError> {
        let users = Arc::new(UserStore::new());
        let tokens = Arc::new(JwtTokens::new(config.jwt_secret.as_bytes()));
        let google: Arc<dyn GoogleTokenVerifier> = Arc::new(MockGoogleVerifier);

        services.insert(users);
        services.insert(Arc::clone(&tokens));
        services.insert::<dyn GoogleTokenVerifier>(google);
        // Other modules guard their routes through this seam.
        services.insert::<dyn Authenticator>(tokens);

        Ok(())
    }

    fn map_endpoints(&self, services: &ServiceMap, router: Router) -> Result<Router, BootError> {
        let users = services.expect::<UserStore>()?;
        let tokens = services.expect::<JwtTokens>()?;
        let google = services.expect::<dyn GoogleTokenVerifier>()?;
        let auth = services.expect::<dyn Authenticator>()?;
        let dispatcher = services.expect::<EventDispatcher>()?;

        let pipeline = Arc::new(Pipeline::validated(
            login::rules(),
            Arc::new(login::LoginHandler {
                users: Arc::clone(&users),
                google,
                tokens,
                uow: UnitOfWork::new(users, dispatcher),
            }),
        ));

        let public = Router::new()
            .route("/login", post(login_route))
            .layer(Extension(pipeline));

        let protected = Router::new()
            .route("/", get(module_status))
            .layer(middleware::from_fn_with_state(auth, require_auth));

        Ok(router.nest("/api/identity", public.merge(protected)))
    }
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    id_token: String,
}

async fn login_route(
    Extension(pipeline): Extension<Arc<Pipeline<LoginWithGoogle>>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginOutcome>, AppError> {
    let outcome = pipeline
        .send(LoginWithGoogle {
            id_token: body.id_token,
        })
        .await?;
    Ok(Json(outcome))
}

async fn module_status() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "identity module online" }))
}
