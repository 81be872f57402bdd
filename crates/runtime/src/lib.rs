//! `packhub-runtime` — module composition & transactional event dispatch.
//!
//! This crate is the host-side runtime business modules plug into:
//!
//! - **Module registry**: discovers module factories, instantiates each
//!   module once, and runs the strict two-phase boot (all services
//!   registered before any routes are mapped).
//! - **Request pipeline**: ordered cross-cutting behaviors (validation)
//!   wrapping one terminal handler per request type.
//! - **Unit of work**: snapshot → drain → persist → dispatch, so domain
//!   events reach subscribers only after a durable commit, exactly once
//!   per committed change-set.
//! - **Fault boundary**: the single translation point from internal
//!   errors to the external problem shape.

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod module;
pub mod pipeline;
pub mod problem;
pub mod uow;

pub use auth::{Authenticator, CurrentUser};
pub use config::AppConfig;
pub use dispatch::{EventDispatcher, Subscriber, SubscriberError, SubscriberRegistry};
pub use error::{AppError, AppResult, FieldError};
pub use module::{BootError, ComposedModules, Module, ModuleCatalog, ModuleRegistry, ServiceMap};
pub use pipeline::{Behavior, Handle, Next, Pipeline, Request, RuleSet, ValidationBehavior};
pub use problem::ProblemDetails;
pub use uow::{CommitError, PersistError, TransactionalStore, UnitOfWork};
