//! Health module wiring.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Extension, Json, Router, middleware};

use packhub_core::DogId;
use packhub_runtime::{
    AppConfig, AppError, Authenticator, BootError, EventDispatcher, Module, Pipeline,
    ServiceMap, SubscriberRegistry, UnitOfWork, auth::require_auth,
};

use crate::alerts::WeightAlertLogger;
use crate::features::{
    self, LogWeight, RecordVaccination, RegisterDog, register_dog_rules, log_weight_rules,
    record_vaccination_rules,
};
use crate::store::HealthStore;

pub struct HealthModule;

#[async_trait]
impl Module for HealthModule {
    fn name(&self) -> &'static str {
        "health"
    }

    async fn register_services(
        &self,
        services: &mut ServiceMap,
        _config: &AppConfig,
    ) -> Result<(), BootError> {
        services.insert(Arc::new(HealthStore::new()));

        let subscribers = services.expect::<SubscriberRegistry>()?;
        subscribers.subscribe(Arc::new(WeightAlertLogger));

        Ok(())
    }

    fn map_endpoints(&self, services: &ServiceMap, router: Router) -> Result<Router, BootError> {
        let dogs = services.expect::<HealthStore>()?;
        let auth = services.expect::<dyn Authenticator>()?;
        let dispatcher = services.expect::<EventDispatcher>()?;

        let register = Arc::new(Pipeline::validated(
            register_dog_rules(),
            Arc::new(features::RegisterDogHandler {
                uow: UnitOfWork::new(Arc::clone(&dogs), Arc::clone(&dispatcher)),
            }),
        ));
        let log_weight = Arc::new(Pipeline::validated(
            log_weight_rules(),
            Arc::new(features::LogWeightHandler {
                dogs: Arc::clone(&dogs),
                uow: UnitOfWork::new(Arc::clone(&dogs), Arc::clone(&dispatcher)),
            }),
        ));
        let vaccinate = Arc::new(Pipeline::validated(
            record_vaccination_rules(),
            Arc::new(features::RecordVaccinationHandler {
                dogs: Arc::clone(&dogs),
                uow: UnitOfWork::new(dogs, dispatcher),
            }),
        ));

        let routes = Router::new()
            .route("/dogs", post(register_dog_route))
            .route("/weight", post(log_weight_route))
            .route("/vaccinations", post(record_vaccination_route))
            .layer(Extension(register))
            .layer(Extension(log_weight))
            .layer(Extension(vaccinate))
            .layer(middleware::from_fn_with_state(auth, require_auth));

        Ok(router.nest("/api/health", routes))
    }
}

async fn register_dog_route(
    Extension(pipeline): Extension<Arc<Pipeline<RegisterDog>>>,
    Json(request): Json<RegisterDog>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let id: DogId = pipeline.send(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id.to_string() })),
    ))
}

async fn log_weight_route(
    Extension(pipeline): Extension<Arc<Pipeline<LogWeight>>>,
    Json(request): Json<LogWeight>,
) -> Result<Json<serde_json::Value>, AppError> {
    pipeline.send(request).await?;
    Ok(Json(serde_json::json!({ "message": "Weight logged." })))
}

async fn record_vaccination_route(
    Extension(pipeline): Extension<Arc<Pipeline<RecordVaccination>>>,
    Json(request): Json<RecordVaccination>,
) -> Result<Json<serde_json::Value>, AppError> {
    pipeline.send(request).await?;
    Ok(Json(serde_json::json!({
        "message": "Vaccination recorded successfully."
    })))
}
