//! In-memory dog profile store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use packhub_core::{DogId, Entity};
use packhub_runtime::{PersistError, TransactionalStore};

use crate::dog::DogProfile;

/// Process-local dog storage. The whole change-set lands under one write
/// lock, giving the commit its all-or-nothing semantics.
#[derive(Debug, Default)]
pub struct HealthStore {
    dogs: RwLock<HashMap<DogId, DogProfile>>,
}

impl HealthStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &DogId) -> Option<DogProfile> {
        self.dogs.read().ok()?.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.dogs.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TransactionalStore for HealthStore {
    type Change = DogProfile;

    async fn persist(&self, changes: Vec<DogProfile>) -> Result<usize, PersistError> {
        let mut dogs = self
            .dogs
            .write()
            .map_err(|_| PersistError::Unavailable("health store lock poisoned".to_string()))?;

        let count = changes.len();
        for dog in changes {
            dogs.insert(*dog.id(), dog);
        }
        Ok(count)
    }
}
