//! In-memory user store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use packhub_core::{Entity, UserId};
use packhub_runtime::{PersistError, TransactionalStore};

use crate::user::User;

/// Process-local user storage. The whole change-set lands under one write
/// lock, giving the commit its all-or-nothing semantics.
#[derive(Debug, Default)]
pub struct UserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &UserId) -> Option<User> {
        self.users.read().ok()?.get(id).cloned()
    }

    pub fn find_by_google_subject(&self, subject_id: &str) -> Option<User> {
        self.users
            .read()
            .ok()?
            .values()
            .find(|u| u.google_subject_id() == subject_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TransactionalStore for UserStore {
    type Change = User;

    async fn persist(&self, changes: Vec<User>) -> Result<usize, PersistError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| PersistError::Unavailable("user store lock poisoned".to_string()))?;

        let count = changes.len();
        for user in changes {
            users.insert(*user.id(), user);
        }
        Ok(count)
    }
}
