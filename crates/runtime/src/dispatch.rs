//! Event subscription and post-commit dispatch.
//!
//! Subscribers register interest in one event kind during phase one of the
//! boot. The registry is frozen into an [`EventDispatcher`] — a typed map
//! from kind tag to handler list — before any route is mapped, and is
//! read-only afterwards.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use packhub_core::RecordedEvent;

/// A subscriber reaction failed after its event's commit succeeded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("subscriber for `{kind}` failed: {reason}")]
pub struct SubscriberError {
    pub kind: &'static str,
    pub reason: String,
}

impl SubscriberError {
    pub fn new(kind: &'static str, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    /// The recorded payload was not of the type this subscriber expects.
    pub fn payload_mismatch(kind: &'static str) -> Self {
        Self::new(kind, "recorded payload has an unexpected type")
    }
}

/// A reaction to one event kind.
///
/// Dispatch is synchronous with the committing request; subscribers must
/// tolerate partial delivery (an earlier subscriber failure stops the
/// fan-out, but the commit stands).
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Event kind this subscriber is registered for.
    fn kind(&self) -> &'static str;

    async fn on_event(&self, event: &RecordedEvent) -> Result<(), SubscriberError>;
}

/// Collects subscriptions during the service-registration phase.
#[derive(Default)]
pub struct SubscriberRegistry {
    pending: Mutex<Vec<Arc<dyn Subscriber>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(subscriber);
        }
    }

    /// Build the dispatcher's kind map. Subscriptions after this point are
    /// lost; the composition root removes the registry from the service
    /// set when it freezes.
    pub fn freeze(&self) -> EventDispatcher {
        let pending = self
            .pending
            .lock()
            .map(|mut p| core::mem::take(&mut *p))
            .unwrap_or_default();

        let mut subscribers: HashMap<&'static str, Vec<Arc<dyn Subscriber>>> = HashMap::new();
        for subscriber in pending {
            subscribers.entry(subscriber.kind()).or_default().push(subscriber);
        }

        EventDispatcher { subscribers }
    }
}

impl core::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let count = self.pending.lock().map(|p| p.len()).unwrap_or(0);
        f.debug_struct("SubscriberRegistry")
            .field("pending", &count)
            .finish()
    }
}

/// Delivers recorded events to their kind's subscribers.
///
/// Delivery is sequential: all subscribers for event N complete (or fail)
/// before event N+1 starts. Events with no subscribers are dropped
/// silently — in-process dispatch makes no durable-delivery promise.
pub struct EventDispatcher {
    subscribers: HashMap<&'static str, Vec<Arc<dyn Subscriber>>>,
}

impl EventDispatcher {
    pub fn subscriber_count(&self, kind: &str) -> usize {
        self.subscribers.get(kind).map_or(0, Vec::len)
    }

    /// Deliver one event to every subscriber registered for its kind.
    pub async fn dispatch(&self, event: &RecordedEvent) -> Result<(), SubscriberError> {
        let Some(subscribers) = self.subscribers.get(event.kind()) else {
            tracing::debug!(kind = event.kind(), "no subscribers for event kind");
            return Ok(());
        };

        for subscriber in subscribers {
            subscriber.on_event(event).await?;
        }

        Ok(())
    }
}

impl core::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("kinds", &self.subscribers.keys().collect::<Vec<_>>())
            .finish()
    }
}
