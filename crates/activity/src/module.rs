//! Activity module wiring.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};

use packhub_core::LocationId;
use packhub_runtime::{
    AppConfig, AppError, Authenticator, BootError, EventDispatcher, Module, Pipeline,
    ServiceMap, UnitOfWork, auth::require_auth,
};

use crate::features::{
    self, AddLocation, LocationView, NearbyLocations, add_location_rules, nearby_rules,
};
use crate::store::ActivityStore;

pub struct ActivityModule;

#[async_trait]
impl Module for ActivityModule {
    fn name(&self) -> &'static str {
        "activity"
    }

    async fn register_services(
        &self,
        services: &mut ServiceMap,
        _config: &AppConfig,
    ) -> Result<(), BootError> {
        services.insert(Arc::new(ActivityStore::new()));
        Ok(())
    }

    fn map_endpoints(&self, services: &ServiceMap, router: Router) -> Result<Router, BootError> {
        let locations = services.expect::<ActivityStore>()?;
        let auth = services.expect::<dyn Authenticator>()?;
        let dispatcher = services.expect::<EventDispatcher>()?;

        let add = Arc::new(Pipeline::validated(
            add_location_rules(),
            Arc::new(features::AddLocationHandler {
                uow: UnitOfWork::new(Arc::clone(&locations), dispatcher),
            }),
        ));
        let nearby = Arc::new(Pipeline::validated(
            nearby_rules(),
            Arc::new(features::NearbyLocationsHandler { locations }),
        ));

        let routes = Router::new()
            .route("/", get(module_status))
            .route("/locations", post(add_location_route))
            .route("/locations/nearby", get(nearby_route))
            .layer(Extension(add))
            .layer(Extension(nearby))
            .layer(middleware::from_fn_with_state(auth, require_auth));

        Ok(router.nest("/api/activity", routes))
    }
}

async fn module_status() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "activity module online" }))
}

async fn add_location_route(
    Extension(pipeline): Extension<Arc<Pipeline<AddLocation>>>,
    Json(request): Json<AddLocation>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let id: LocationId = pipeline.send(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id.to_string() })),
    ))
}

async fn nearby_route(
    Extension(pipeline): Extension<Arc<Pipeline<NearbyLocations>>>,
    Query(request): Query<NearbyLocations>,
) -> Result<Json<Vec<LocationView>>, AppError> {
    let locations = pipeline.send(request).await?;
    Ok(Json(locations))
}
