//! User entity.

use chrono::{DateTime, Utc};

use packhub_core::{Entity, EventBuffer, UserId};
use packhub_runtime::{AppError, AppResult};

/// A registered user, keyed by the Google subject that proved their
/// identity at first login.
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    email: String,
    first_name: String,
    last_name: String,
    google_subject_id: String,
    created_at: DateTime<Utc>,
    events: EventBuffer,
}

impl User {
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        google_subject_id: impl Into<String>,
    ) -> AppResult<Self> {
        let email = email.into();
        let google_subject_id = google_subject_id.into();

        if email.trim().is_empty() {
            return Err(AppError::invalid("email", "Email is required."));
        }
        if google_subject_id.trim().is_empty() {
            return Err(AppError::invalid(
                "google_subject_id",
                "Google subject is required.",
            ));
        }

        Ok(Self {
            id,
            email,
            first_name: first_name.into(),
            last_name: last_name.into(),
            google_subject_id,
            created_at: Utc::now(),
            events: EventBuffer::new(),
        })
    }

    /// Refresh the display name from the identity provider's profile.
    pub fn update_name(&mut self, first_name: impl Into<String>, last_name: impl Into<String>) {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn google_subject_id(&self) -> &str {
        &self.google_subject_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for User {
    type Id = UserId;

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
