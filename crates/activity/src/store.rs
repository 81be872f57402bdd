//! In-memory location store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use packhub_core::{Entity, LocationId};
use packhub_runtime::{PersistError, TransactionalStore};

use crate::location::Location;

/// Process-local location storage.
#[derive(Debug, Default)]
pub struct ActivityStore {
    locations: RwLock<HashMap<LocationId, Location>>,
}

impl ActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &LocationId) -> Option<Location> {
        self.locations.read().ok()?.get(id).cloned()
    }

    pub fn all(&self) -> Vec<Location> {
        self.locations
            .read()
            .map(|l| l.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.locations.read().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TransactionalStore for ActivityStore {
    type Change = Location;

    async fn persist(&self, changes: Vec<Location>) -> Result<usize, PersistError> {
        let mut locations = self
            .locations
            .write()
            .map_err(|_| PersistError::Unavailable("activity store lock poisoned".to_string()))?;

        let count = changes.len();
        for location in changes {
            locations.insert(*location.id(), location);
        }
        Ok(count)
    }
}
