//! Person repository.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate compiles
//! without a live database.

use sqlx::PgPool;

use barberq_core::{Email, PersonId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::Person;

/// Repository for person database operations.
pub struct PersonRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PersonRepository<'a> {
    /// Create a new person repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a person by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: PersonId) -> Result<Option<Person>, RepositoryError> {
        let person = sqlx::query_as::<_, Person>(
            r"
            SELECT id, name, phone, email, external_id, role, created_at, updated_at
            FROM person
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(person)
    }

    /// Get a person by identity-provider subject.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Person>, RepositoryError> {
        let person = sqlx::query_as::<_, Person>(
            r"
            SELECT id, name, phone, email, external_id, role, created_at, updated_at
            FROM person
            WHERE external_id = $1
            ",
        )
        .bind(external_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(person)
    }

    /// Get a person by email, whatever their role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Person>, RepositoryError> {
        let person = sqlx::query_as::<_, Person>(
            r"
            SELECT id, name, phone, email, external_id, role, created_at, updated_at
            FROM person
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(person)
    }

    /// Create or refresh a barber keyed by email.
    ///
    /// A fresh `name` replaces the stored one; `external_id` is only recorded
    /// when none is stored yet. An existing person with this email becomes a
    /// barber.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `external_id` belongs to another person.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn upsert_barber(
        &self,
        email: &Email,
        name: Option<&str>,
        external_id: Option<&str>,
    ) -> Result<Person, RepositoryError> {
        sqlx::query_as::<_, Person>(
            r"
            INSERT INTO person (email, name, external_id, role)
            VALUES ($1, $2, $3, 'barber')
            ON CONFLICT (email) WHERE email IS NOT NULL DO UPDATE
            SET name = COALESCE(EXCLUDED.name, person.name),
                external_id = COALESCE(person.external_id, EXCLUDED.external_id),
                role = 'barber',
                updated_at = now()
            RETURNING id, name, phone, email, external_id, role, created_at, updated_at
            ",
        )
        .bind(email)
        .bind(name)
        .bind(external_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "identity"))
    }

    /// Register a barber for a verified identity.
    ///
    /// Returns the person and whether it was created. An identity that is
    /// already registered is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email belongs to another person.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn register_barber(
        &self,
        external_id: &str,
        name: Option<&str>,
        email: Option<&Email>,
    ) -> Result<(Person, bool), RepositoryError> {
        let inserted = sqlx::query_as::<_, Person>(
            r"
            INSERT INTO person (external_id, name, email, role)
            VALUES ($1, $2, $3, 'barber')
            ON CONFLICT (external_id) WHERE external_id IS NOT NULL DO NOTHING
            RETURNING id, name, phone, email, external_id, role, created_at, updated_at
            ",
        )
        .bind(external_id)
        .bind(name)
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        if let Some(person) = inserted {
            return Ok((person, true));
        }

        let existing = self
            .get_by_external_id(external_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok((existing, false))
    }

    /// List all barbers, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_barbers(&self) -> Result<Vec<Person>, RepositoryError> {
        let barbers = sqlx::query_as::<_, Person>(
            r"
            SELECT id, name, phone, email, external_id, role, created_at, updated_at
            FROM person
            WHERE role = 'barber'
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(barbers)
    }
}
