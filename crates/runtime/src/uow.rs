//! Unit of work: snapshot → drain → persist → dispatch.
//!
//! The commit protocol guarantees that domain events raised by entities
//! during a transaction reach subscribers only after the transaction
//! durably commits, exactly once per committed change-set:
//!
//! 1. **Snapshot**: copy pending events out of every changed entity, in
//!    raise order per entity, concatenated in traversal order.
//! 2. **Drain**: clear the buffers *before* the store commit, so a failed
//!    commit cannot leave stale events behind for a later re-dispatch.
//! 3. **Persist**: the store's durable, all-or-nothing commit. On failure
//!    the error propagates and nothing is dispatched.
//! 4. **Dispatch**: only after a successful commit, deliver each event in
//!    order; all subscribers of event N run before event N+1.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use packhub_core::Entity;

use crate::dispatch::{EventDispatcher, SubscriberError};

/// Durable commit failure — the write did not happen.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistError {
    /// The store rejected the change-set.
    #[error("storage rejected the commit: {0}")]
    Rejected(String),

    /// The store could not be reached or its state is unusable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Commit outcome errors. Callers can distinguish "my write did not
/// happen" (`Persist`) from "my write happened but a reaction failed"
/// (`Reaction`).
#[derive(Debug, Error)]
pub enum CommitError {
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// The commit stands; a post-commit subscriber failed. Delivery may be
    /// partial and is not retried.
    #[error("persisted {persisted} change(s), then a reaction failed: {source}")]
    Reaction {
        persisted: usize,
        source: SubscriberError,
    },

    /// The commit task died before completing (process-level fault).
    #[error("commit task aborted before completion")]
    Aborted,
}

impl From<CommitError> for crate::error::AppError {
    fn from(value: CommitError) -> Self {
        // Detail stays internal; the fault boundary emits the generic shape.
        match value {
            CommitError::Persist(e) => Self::unexpected(format!("commit failed: {e}")),
            CommitError::Reaction { persisted, source } => Self::unexpected(format!(
                "persisted {persisted} change(s), post-commit reaction failed: {source}"
            )),
            CommitError::Aborted => Self::unexpected("commit task aborted"),
        }
    }
}

/// The sole durable mutation point for a module's entities.
///
/// `persist` must be all-or-nothing; the runtime layers no extra locking
/// on top of it.
#[async_trait]
pub trait TransactionalStore: Send + Sync + 'static {
    type Change: Entity + Send + 'static;

    /// Durably commit the change-set, returning the number of persisted
    /// changes.
    async fn persist(&self, changes: Vec<Self::Change>) -> Result<usize, PersistError>;
}

/// Transactional boundary from entity mutation through durable commit,
/// with post-commit event dispatch.
pub struct UnitOfWork<S> {
    store: Arc<S>,
    dispatcher: Arc<EventDispatcher>,
}

impl<S> UnitOfWork<S> {
    pub fn new(store: Arc<S>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self { store, dispatcher }
    }
}

impl<S: TransactionalStore> UnitOfWork<S> {
    /// Commit the changed entities and dispatch their recorded events.
    ///
    /// Once issued, the persist-then-dispatch section runs on its own task
    /// which the caller awaits: cancelling the calling request cannot skip
    /// dispatch after the commit has started.
    pub async fn commit(&self, mut changes: Vec<S::Change>) -> Result<usize, CommitError> {
        // Snapshot + drain before the store sees the change-set.
        let mut collected = Vec::new();
        for change in &mut changes {
            collected.extend(change.events_mut().drain());
        }

        let store = Arc::clone(&self.store);
        let dispatcher = Arc::clone(&self.dispatcher);

        let task = tokio::spawn(async move {
            let persisted = store.persist(changes).await?;

            for event in &collected {
                if let Err(source) = dispatcher.dispatch(event).await {
                    tracing::error!(
                        kind = event.kind(),
                        subject = %event.subject(),
                        error = %source,
                        "post-commit subscriber failed; commit stands"
                    );
                    return Err(CommitError::Reaction { persisted, source });
                }
            }

            Ok(persisted)
        });

        task.await.map_err(|_| CommitError::Aborted)?
    }
}

impl<S> core::fmt::Debug for UnitOfWork<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UnitOfWork").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Subscriber, SubscriberRegistry};
    use packhub_core::{DomainEvent, EventBuffer, RecordedEvent};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use uuid::Uuid;

    #[derive(Debug, Clone, PartialEq)]
    struct Renamed {
        id: Uuid,
        n: u32,
    }

    impl DomainEvent for Renamed {
        const KIND: &'static str = "test.renamed";

        fn subject(&self) -> Uuid {
            self.id
        }
    }

    #[derive(Debug, Clone)]
    struct Widget {
        id: Uuid,
        events: EventBuffer,
    }

    impl Widget {
        fn new() -> Self {
            Self {
                id: Uuid::now_v7(),
                events: EventBuffer::new(),
            }
        }

        fn rename(&mut self, n: u32) {
            self.events.raise(Renamed { id: self.id, n });
        }
    }

    impl Entity for Widget {
        type Id = Uuid;

        fn id(&self) -> &Self::Id {
            &self.id
        }

        fn events(&self) -> &EventBuffer {
            &self.events
        }

        fn events_mut(&mut self) -> &mut EventBuffer {
            &mut self.events
        }
    }

    struct WidgetStore {
        fail: AtomicBool,
        persisted: Mutex<Vec<Widget>>,
    }

    impl WidgetStore {
        fn new() -> Self {
            Self {
                fail: AtomicBool::new(false),
                persisted: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TransactionalStore for WidgetStore {
        type Change = Widget;

        async fn persist(&self, changes: Vec<Widget>) -> Result<usize, PersistError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PersistError::Unavailable("disk on fire".to_string()));
            }
            let count = changes.len();
            self.persisted.lock().unwrap().extend(changes);
            Ok(count)
        }
    }

    struct Recorder {
        seen: Mutex<Vec<u32>>,
        fail: bool,
    }

    #[async_trait]
    impl Subscriber for Recorder {
        fn kind(&self) -> &'static str {
            Renamed::KIND
        }

        async fn on_event(&self, event: &RecordedEvent) -> Result<(), SubscriberError> {
            let renamed = event
                .payload::<Renamed>()
                .ok_or_else(|| SubscriberError::payload_mismatch(event.kind()))?;
            self.seen.lock().unwrap().push(renamed.n);
            if self.fail {
                return Err(SubscriberError::new(event.kind(), "reaction broke"));
            }
            Ok(())
        }
    }

    fn unit_of_work(
        store: Arc<WidgetStore>,
        recorder: Arc<Recorder>,
    ) -> UnitOfWork<WidgetStore> {
        let registry = SubscriberRegistry::new();
        registry.subscribe(recorder);
        UnitOfWork::new(store, Arc::new(registry.freeze()))
    }

    #[tokio::test]
    async fn successful_commit_dispatches_every_event_once_in_order() {
        let store = Arc::new(WidgetStore::new());
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
            fail: false,
        });
        let uow = unit_of_work(store.clone(), recorder.clone());

        let mut a = Widget::new();
        let mut b = Widget::new();
        a.rename(1);
        a.rename(2);
        b.rename(3);

        let persisted = uow.commit(vec![a, b]).await.unwrap();

        assert_eq!(persisted, 2);
        assert_eq!(*recorder.seen.lock().unwrap(), vec![1, 2, 3]);
        // Persisted entities carry empty buffers (events are never stored).
        assert!(store
            .persisted
            .lock()
            .unwrap()
            .iter()
            .all(|w| w.events().is_empty()));
    }

    #[tokio::test]
    async fn failed_persist_dispatches_nothing_and_buffers_stay_drained() {
        let store = Arc::new(WidgetStore::new());
        store.fail.store(true, Ordering::SeqCst);
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
            fail: false,
        });
        let uow = unit_of_work(store.clone(), recorder.clone());

        let mut widget = Widget::new();
        widget.rename(9);

        let err = uow.commit(vec![widget]).await.unwrap_err();
        assert!(matches!(err, CommitError::Persist(_)));
        assert!(recorder.seen.lock().unwrap().is_empty());
        assert!(store.persisted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn subscriber_failure_is_distinct_from_persist_failure() {
        let store = Arc::new(WidgetStore::new());
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
            fail: true,
        });
        let uow = unit_of_work(store.clone(), recorder.clone());

        let mut widget = Widget::new();
        widget.rename(4);

        let err = uow.commit(vec![widget]).await.unwrap_err();
        match err {
            CommitError::Reaction { persisted, .. } => assert_eq!(persisted, 1),
            other => panic!("expected Reaction, got {other:?}"),
        }
        // The write stands even though the reaction failed.
        assert_eq!(store.persisted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn entity_without_events_commits_cleanly() {
        let store = Arc::new(WidgetStore::new());
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
            fail: false,
        });
        let uow = unit_of_work(store.clone(), recorder.clone());

        let persisted = uow.commit(vec![Widget::new()]).await.unwrap();
        assert_eq!(persisted, 1);
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_commits_each_dispatch_only_their_own_events() {
        let store = Arc::new(WidgetStore::new());
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
            fail: false,
        });
        let uow = Arc::new(unit_of_work(store.clone(), recorder.clone()));

        let mut a = Widget::new();
        let mut b = Widget::new();
        a.rename(10);
        b.rename(20);

        let (ra, rb) = tokio::join!(uow.commit(vec![a]), uow.commit(vec![b]));
        assert_eq!(ra.unwrap() + rb.unwrap(), 2);

        let mut seen = recorder.seen.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, vec![10, 20]);
    }
}
