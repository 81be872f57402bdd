//! Module contract, discovery, and the two-phase composition root.
//!
//! Modules are independently built units that contribute services and
//! routes to the host process. Composition is a strict two-phase boot:
//! every module registers its services first, then every module maps its
//! routes. Route handlers may resolve services eagerly, so the phases
//! must never interleave.
//!
//! Both phases consume their input value, so a registry cannot compose
//! services twice and a composed set cannot map routes twice.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use thiserror::Error;

use crate::config::AppConfig;
use crate::dispatch::SubscriberRegistry;

/// Boot-time failure. Always fatal: the process must never serve with a
/// partially composed module set.
#[derive(Debug, Error)]
pub enum BootError {
    /// An enabled module name has no registered factory.
    #[error("unknown module `{0}`")]
    UnknownModule(String),

    /// A module's service or route contribution failed.
    #[error("module `{module}` failed to compose: {reason}")]
    Contribution { module: &'static str, reason: String },

    /// A route contribution resolved a service nobody registered.
    #[error("required service `{0}` is not registered")]
    MissingService(&'static str),
}

impl BootError {
    pub fn contribution(module: &'static str, reason: impl core::fmt::Display) -> Self {
        Self::Contribution {
            module,
            reason: reason.to_string(),
        }
    }
}

/// Process-wide service container.
///
/// Keyed by service type; written only during the boot sequence and
/// read-only afterwards. Unsized keys are supported, so trait objects can
/// be registered as `ServiceMap::insert::<dyn MyTrait>(arc)`.
#[derive(Default)]
pub struct ServiceMap {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the service of type `T`.
    pub fn insert<T>(&mut self, service: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.entries.insert(TypeId::of::<T>(), Box::new(service));
    }

    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<Arc<T>>())
            .map(Arc::clone)
    }

    /// Resolve a service that must have been registered during phase one.
    pub fn expect<T>(&self) -> Result<Arc<T>, BootError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get::<T>()
            .ok_or(BootError::MissingService(core::any::type_name::<T>()))
    }

    pub(crate) fn remove<T>(&mut self)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.entries.remove(&TypeId::of::<T>());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl core::fmt::Debug for ServiceMap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServiceMap")
            .field("services", &self.entries.len())
            .finish()
    }
}

/// Contract every business module implements.
///
/// Both operations are invoked exactly once per process lifetime, and
/// `map_endpoints` only after every module's `register_services` has
/// completed. Modules are mutually unaware and must not depend on
/// composition order for correctness.
#[async_trait]
pub trait Module: Send + Sync {
    /// Stable module name, used for discovery and diagnostics.
    fn name(&self) -> &'static str;

    /// Contribute services (stores, domain services, subscribers) to the
    /// shared container. Any failure aborts boot.
    async fn register_services(
        &self,
        services: &mut ServiceMap,
        config: &AppConfig,
    ) -> Result<(), BootError>;

    /// Contribute routes. Services may be resolved eagerly here; every
    /// registration from phase one is already visible.
    fn map_endpoints(&self, services: &ServiceMap, router: Router) -> Result<Router, BootError>;
}

type ModuleFactory = fn() -> Box<dyn Module>;

/// Explicit registry of module factories.
///
/// Replaces deployment-directory scanning: the set of composable modules
/// is declared in code, and configuration selects which of them to load.
#[derive(Default)]
pub struct ModuleCatalog {
    factories: Vec<(&'static str, ModuleFactory)>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, name: &'static str, factory: ModuleFactory) -> Self {
        self.factories.push((name, factory));
        self
    }

    /// Instantiate the enabled modules, one instance each.
    ///
    /// An empty `enabled` list selects every registered module. Enumeration
    /// order follows the catalog / enabled list, but is not part of the
    /// contract.
    pub fn discover(&self, enabled: &[String]) -> Result<ModuleRegistry, BootError> {
        let modules = if enabled.is_empty() {
            self.factories.iter().map(|(_, f)| f()).collect()
        } else {
            enabled
                .iter()
                .map(|name| {
                    self.factories
                        .iter()
                        .find(|(n, _)| n == name)
                        .map(|(_, f)| f())
                        .ok_or_else(|| BootError::UnknownModule(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(ModuleRegistry { modules })
    }
}

/// Discovered module instances, ready for phase one.
pub struct ModuleRegistry {
    modules: Vec<Box<dyn Module>>,
}

impl ModuleRegistry {
    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Phase one: run every module's service contribution, in discovery
    /// order, accumulating into one shared container. Fail-fast: the first
    /// contribution error aborts the boot.
    ///
    /// The subscriber registry is seeded before any module runs and frozen
    /// into the event dispatcher afterwards, so the dispatcher's kind map
    /// is built exactly once, between the two phases.
    pub async fn compose_services(self, config: &AppConfig) -> Result<ComposedModules, BootError> {
        let mut services = ServiceMap::new();

        let subscribers = Arc::new(SubscriberRegistry::new());
        services.insert(Arc::clone(&subscribers));

        for module in &self.modules {
            tracing::info!(module = module.name(), "registering module services");
            module.register_services(&mut services, config).await?;
        }

        // Freeze subscriptions; late subscribe attempts have nothing to
        // resolve against.
        services.remove::<SubscriberRegistry>();
        services.insert(Arc::new(subscribers.freeze()));

        Ok(ComposedModules {
            modules: self.modules,
            services,
        })
    }
}

impl core::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.module_names())
            .finish()
    }
}

/// Phase-one output: live module instances plus the composed service set.
///
/// Consuming `compose_routes` is the only way to get a router, so each
/// module's route contribution runs exactly once.
pub struct ComposedModules {
    modules: Vec<Box<dyn Module>>,
    services: ServiceMap,
}

impl std::fmt::Debug for ComposedModules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedModules")
            .field("modules", &self.modules.len())
            .finish_non_exhaustive()
    }
}

impl ComposedModules {
    pub fn services(&self) -> &ServiceMap {
        &self.services
    }

    /// Phase two: run every module's route contribution exactly once.
    pub fn compose_routes(self) -> Result<(Router, ServiceMap), BootError> {
        let mut router = Router::new();
        for module in &self.modules {
            tracing::info!(module = module.name(), "mapping module endpoints");
            router = module.map_endpoints(&self.services, router)?;
        }
        Ok((router, self.services))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Greeting(String);

    static SERVICE_CALLS: AtomicUsize = AtomicUsize::new(0);
    static ROUTE_CALLS: AtomicUsize = AtomicUsize::new(0);

    struct GreeterModule;

    #[async_trait]
    impl Module for GreeterModule {
        fn name(&self) -> &'static str {
            "greeter"
        }

        async fn register_services(
            &self,
            services: &mut ServiceMap,
            _config: &AppConfig,
        ) -> Result<(), BootError> {
            SERVICE_CALLS.fetch_add(1, Ordering::SeqCst);
            services.insert(Arc::new(Greeting("hello".to_string())));
            Ok(())
        }

        fn map_endpoints(
            &self,
            services: &ServiceMap,
            router: Router,
        ) -> Result<Router, BootError> {
            ROUTE_CALLS.fetch_add(1, Ordering::SeqCst);
            // Eager resolution: phase one must be complete.
            services.expect::<Greeting>()?;
            Ok(router)
        }
    }

    struct BrokenModule;

    #[async_trait]
    impl Module for BrokenModule {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn register_services(
            &self,
            _services: &mut ServiceMap,
            _config: &AppConfig,
        ) -> Result<(), BootError> {
            Err(BootError::contribution("broken", "store unavailable"))
        }

        fn map_endpoints(
            &self,
            _services: &ServiceMap,
            _router: Router,
        ) -> Result<Router, BootError> {
            panic!("routes must never be mapped for a failed boot");
        }
    }

    fn catalog() -> ModuleCatalog {
        ModuleCatalog::new()
            .register("greeter", || Box::new(GreeterModule))
            .register("broken", || Box::new(BrokenModule))
    }

    #[tokio::test]
    async fn two_phase_boot_runs_each_contribution_once() {
        SERVICE_CALLS.store(0, Ordering::SeqCst);
        ROUTE_CALLS.store(0, Ordering::SeqCst);

        let registry = catalog().discover(&["greeter".to_string()]).unwrap();
        let composed = registry
            .compose_services(&AppConfig::for_tests("s"))
            .await
            .unwrap();
        let (_router, services) = composed.compose_routes().unwrap();

        assert_eq!(SERVICE_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(ROUTE_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(
            services.get::<Greeting>().unwrap().as_ref(),
            &Greeting("hello".to_string())
        );
    }

    #[tokio::test]
    async fn failed_service_contribution_aborts_before_routes() {
        let registry = catalog()
            .discover(&["broken".to_string(), "greeter".to_string()])
            .unwrap();

        let err = registry
            .compose_services(&AppConfig::for_tests("s"))
            .await
            .unwrap_err();
        match err {
            BootError::Contribution { module, .. } => assert_eq!(module, "broken"),
            other => panic!("expected Contribution, got {other:?}"),
        }
    }

    #[test]
    fn unknown_module_name_is_a_boot_failure() {
        let err = catalog().discover(&["payments".to_string()]).unwrap_err();
        match err {
            BootError::UnknownModule(name) => assert_eq!(name, "payments"),
            other => panic!("expected UnknownModule, got {other:?}"),
        }
    }

    #[test]
    fn empty_enabled_list_selects_the_whole_catalog() {
        let registry = catalog().discover(&[]).unwrap();
        assert_eq!(registry.module_names(), vec!["greeter", "broken"]);
    }

    #[test]
    fn service_map_supports_trait_objects() {
        trait Sayer: Send + Sync {
            fn say(&self) -> &'static str;
        }

        struct Woof;
        impl Sayer for Woof {
            fn say(&self) -> &'static str {
                "woof"
            }
        }

        let mut services = ServiceMap::new();
        let sayer: Arc<dyn Sayer> = Arc::new(Woof);
        services.insert::<dyn Sayer>(sayer);

        assert_eq!(services.get::<dyn Sayer>().unwrap().say(), "woof");
        assert!(services.get::<Greeting>().is_none());
    }
}
