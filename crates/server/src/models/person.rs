//! Person records (clients and barbers).

use chrono::{DateTime, Utc};
use serde::Serialize;

use barberq_core::{Email, PersonId, PersonRole};

/// A client or barber.
///
/// Clients are created from a verified phone login; barbers from Google
/// sign-in or token registration.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Person {
    /// Database ID.
    pub id: PersonId,
    /// Display name, if known.
    pub name: Option<String>,
    /// Phone number as provided at login.
    pub phone: Option<String>,
    /// Email address (barbers).
    pub email: Option<Email>,
    /// Identity-provider subject.
    pub external_id: Option<String>,
    /// Client or barber.
    pub role: PersonRole,
    /// When the person was created.
    pub created_at: DateTime<Utc>,
    /// Last modification.
    pub updated_at: DateTime<Utc>,
}

impl Person {
    /// Whether this person owns a queue.
    #[must_use]
    pub fn is_barber(&self) -> bool {
        self.role == PersonRole::Barber
    }
}

/// What `GET /api/profile` returns.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub id: PersonId,
    pub name: Option<String>,
    pub email: Option<Email>,
    pub role: PersonRole,
}

impl From<Person> for ProfileView {
    fn from(person: Person) -> Self {
        Self {
            id: person.id,
            name: person.name,
            email: person.email,
            role: person.role,
        }
    }
}
