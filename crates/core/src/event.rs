//! Domain events and the per-entity pending buffer.
//!
//! Events are immutable facts recorded by entities during state-changing
//! calls. They stay in the entity's [`EventBuffer`] until a unit-of-work
//! commit drains them; they are never persisted.

use std::any::Any;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A business-significant fact about one entity.
///
/// The `KIND` tag is the stable name subscribers register against
/// (e.g. "health.weight_alert"). Payloads are plain data types; the
/// dispatcher hands them back to subscribers via [`RecordedEvent::payload`].
pub trait DomainEvent: Any + Send + Sync + core::fmt::Debug + 'static {
    /// Stable event kind tag used for subscriber matching.
    const KIND: &'static str;

    /// Identifier of the entity the event is about.
    fn subject(&self) -> Uuid;
}

/// A type-erased, recorded domain event.
///
/// Cheap to clone; the typed payload is shared behind an `Arc`.
#[derive(Clone)]
pub struct RecordedEvent {
    subject: Uuid,
    kind: &'static str,
    occurred_at: DateTime<Utc>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl RecordedEvent {
    pub fn record<E: DomainEvent>(event: E) -> Self {
        Self {
            subject: event.subject(),
            kind: E::KIND,
            occurred_at: Utc::now(),
            payload: Arc::new(event),
        }
    }

    pub fn subject(&self) -> Uuid {
        self.subject
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Typed view of the payload. `None` if `E` is not the recorded type.
    pub fn payload<E: DomainEvent>(&self) -> Option<&E> {
        self.payload.downcast_ref::<E>()
    }
}

impl core::fmt::Debug for RecordedEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RecordedEvent")
            .field("kind", &self.kind)
            .field("subject", &self.subject)
            .field("occurred_at", &self.occurred_at)
            .finish_non_exhaustive()
    }
}

/// Ordered buffer of not-yet-dispatched events, embedded by each entity.
///
/// Insertion order is significant and preserved through drain. The buffer
/// is drained exactly once per commit and is never persisted.
#[derive(Debug, Default, Clone)]
pub struct EventBuffer {
    pending: Vec<RecordedEvent>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event at the back of the buffer.
    pub fn raise<E: DomainEvent>(&mut self, event: E) {
        self.pending.push(RecordedEvent::record(event));
    }

    /// Events raised since the last drain, in raise order.
    pub fn pending(&self) -> &[RecordedEvent] {
        &self.pending
    }

    /// Remove and return all pending events, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<RecordedEvent> {
        core::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Pinged {
        id: Uuid,
        n: u32,
    }

    impl DomainEvent for Pinged {
        const KIND: &'static str = "test.pinged";

        fn subject(&self) -> Uuid {
            self.id
        }
    }

    #[test]
    fn raise_preserves_insertion_order() {
        let id = Uuid::now_v7();
        let mut buffer = EventBuffer::new();
        for n in 0..5 {
            buffer.raise(Pinged { id, n });
        }

        let ns: Vec<u32> = buffer
            .pending()
            .iter()
            .map(|e| e.payload::<Pinged>().unwrap().n)
            .collect();
        assert_eq!(ns, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn drain_empties_the_buffer_and_returns_everything_once() {
        let id = Uuid::now_v7();
        let mut buffer = EventBuffer::new();
        buffer.raise(Pinged { id, n: 1 });
        buffer.raise(Pinged { id, n: 2 });

        let drained = buffer.drain();
        assert_eq!(drained.len(), 2);
        assert!(buffer.is_empty());
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn payload_downcast_is_typed() {
        let id = Uuid::now_v7();
        let event = RecordedEvent::record(Pinged { id, n: 7 });

        assert_eq!(event.kind(), "test.pinged");
        assert_eq!(event.subject(), id);
        assert_eq!(event.payload::<Pinged>().unwrap().n, 7);
    }

    proptest! {
        #[test]
        fn drain_returns_exactly_what_was_raised_in_order(ns in proptest::collection::vec(any::<u32>(), 0..32)) {
            let id = Uuid::now_v7();
            let mut buffer = EventBuffer::new();
            for &n in &ns {
                buffer.raise(Pinged { id, n });
            }

            let drained: Vec<u32> = buffer
                .drain()
                .iter()
                .map(|e| e.payload::<Pinged>().unwrap().n)
                .collect();
            prop_assert_eq!(drained, ns);
            prop_assert!(buffer.is_empty());
        }
    }
}
