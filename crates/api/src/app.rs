//! Composition root: catalog, two-phase boot, outer router.

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use tower::ServiceBuilder;

use packhub_activity::ActivityModule;
use packhub_health::HealthModule;
use packhub_identity::IdentityModule;
use packhub_runtime::{AppConfig, BootError, ModuleCatalog, problem::fault_boundary};

/// Every module this binary can compose. Configuration selects a subset;
/// registration order is not a correctness contract.
pub fn module_catalog() -> ModuleCatalog {
    ModuleCatalog::new()
        .register("identity", || Box::new(IdentityModule))
        .register("health", || Box::new(HealthModule))
        .register("activity", || Box::new(ActivityModule))
}

/// Build the serving router, or fail before anything is reachable.
///
/// Phase one registers every module's services (fail-fast), phase two maps
/// every module's routes; the fault boundary wraps the lot.
pub async fn boot(config: &AppConfig) -> Result<Router, BootError> {
    let registry = module_catalog().discover(&config.enabled_modules)?;
    tracing::info!(modules = ?registry.module_names(), "composing modules");

    let composed = registry.compose_services(config).await?;
    let (router, _services) = composed.compose_routes()?;

    Ok(router
        .route("/health", get(health))
        .layer(ServiceBuilder::new().layer(middleware::from_fn(fault_boundary))))
}

async fn health() -> StatusCode {
    StatusCode::OK
}
