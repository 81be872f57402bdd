//! Request pipeline: ordered behaviors around one terminal handler.
//!
//! A [`Pipeline`] is built once per request type at composition time and
//! shared read-only across concurrent requests. Each behavior runs fully,
//! then delegates to the rest of the chain via [`Next`]; the terminal
//! handler never knows which behaviors wrapped it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, AppResult, FieldError};

/// An inbound operation handled through the pipeline.
pub trait Request: Send + 'static {
    type Response: Send + 'static;
}

/// Terminal handler for one request type.
#[async_trait]
pub trait Handle<R: Request>: Send + Sync {
    async fn handle(&self, request: R) -> AppResult<R::Response>;
}

/// A cross-cutting step wrapping the rest of the chain.
#[async_trait]
pub trait Behavior<R: Request>: Send + Sync {
    async fn handle(&self, request: R, next: Next<'_, R>) -> AppResult<R::Response>;
}

/// Continuation over the remaining behaviors and the terminal handler.
pub struct Next<'a, R: Request> {
    behaviors: &'a [Arc<dyn Behavior<R>>],
    handler: &'a dyn Handle<R>,
}

impl<'a, R: Request> Next<'a, R> {
    pub async fn run(self, request: R) -> AppResult<R::Response> {
        match self.behaviors.split_first() {
            Some((behavior, rest)) => {
                behavior
                    .handle(
                        request,
                        Next {
                            behaviors: rest,
                            handler: self.handler,
                        },
                    )
                    .await
            }
            None => self.handler.handle(request).await,
        }
    }
}

/// Behavior chain + terminal handler for one request type.
pub struct Pipeline<R: Request> {
    behaviors: Vec<Arc<dyn Behavior<R>>>,
    handler: Arc<dyn Handle<R>>,
}

impl<R: Request> Pipeline<R> {
    pub fn new(handler: Arc<dyn Handle<R>>) -> Self {
        Self {
            behaviors: Vec::new(),
            handler,
        }
    }

    /// Append a behavior; order of calls is execution order.
    pub fn with_behavior(mut self, behavior: Arc<dyn Behavior<R>>) -> Self {
        self.behaviors.push(behavior);
        self
    }

    /// The standard chain: validation, then the terminal handler.
    pub fn validated(rules: RuleSet<R>, handler: Arc<dyn Handle<R>>) -> Self {
        Self::new(handler).with_behavior(Arc::new(ValidationBehavior::new(rules)))
    }

    pub async fn send(&self, request: R) -> AppResult<R::Response> {
        Next {
            behaviors: &self.behaviors,
            handler: self.handler.as_ref(),
        }
        .run(request)
        .await
    }
}

impl<R: Request> core::fmt::Debug for Pipeline<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pipeline")
            .field("behaviors", &self.behaviors.len())
            .finish_non_exhaustive()
    }
}

type Rule<R> = Box<dyn Fn(&R) -> Option<FieldError> + Send + Sync>;

/// Ordered validation rules for one request type.
#[derive(Default)]
pub struct RuleSet<R> {
    rules: Vec<Rule<R>>,
}

impl<R> RuleSet<R> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule for `field`. The closure returns a message when the rule
    /// fails.
    pub fn rule(
        mut self,
        field: &'static str,
        check: impl Fn(&R) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.rules
            .push(Box::new(move |request| {
                check(request).map(|message| FieldError::new(field, message))
            }));
        self
    }

    /// Evaluate every rule, collecting failures in rule order.
    pub fn evaluate(&self, request: &R) -> Vec<FieldError> {
        self.rules
            .iter()
            .filter_map(|rule| rule(request))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<R> core::fmt::Debug for RuleSet<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RuleSet").field("rules", &self.rules.len()).finish()
    }
}

/// Validation step: evaluates the request's rule set and short-circuits
/// with `AppError::Validation` before the terminal handler runs. An empty
/// rule set is a pass-through.
pub struct ValidationBehavior<R> {
    rules: RuleSet<R>,
}

impl<R> ValidationBehavior<R> {
    pub fn new(rules: RuleSet<R>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl<R: Request> Behavior<R> for ValidationBehavior<R> {
    async fn handle(&self, request: R, next: Next<'_, R>) -> AppResult<R::Response> {
        let failures = self.rules.evaluate(&request);
        if !failures.is_empty() {
            return Err(AppError::Validation(failures));
        }
        next.run(request).await
    }
}
