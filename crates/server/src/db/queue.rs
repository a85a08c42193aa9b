//! Queue entry repository.
//!
//! Every multi-statement operation runs in a single transaction. The
//! one-active-entry rule is enforced by the `queue_entry_one_active` partial
//! unique index, so concurrent joins cannot create duplicates.

use sqlx::PgPool;

use barberq_core::{PersonId, QueueEntryId, QueueStatus};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Person, QueueRow};

/// Client profile taken from a verified identity.
#[derive(Debug, Clone)]
pub struct NewClient {
    /// Identity-provider subject.
    pub external_id: String,
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Result of a join.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// The client after the upsert.
    pub client: Person,
    /// The client's active entry with the barber.
    pub entry_id: QueueEntryId,
    /// Whether a new entry was inserted.
    pub created: bool,
}

/// Rows deleted by clearing a queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ClearedQueue {
    pub entries: u64,
    pub persons: u64,
}

/// Repository for queue entry database operations.
pub struct QueueRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> QueueRepository<'a> {
    /// Create a new queue repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a barber's entries in queue order, skipping `exclude` statuses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_barber(
        &self,
        barber_id: PersonId,
        exclude: &[QueueStatus],
    ) -> Result<Vec<QueueRow>, RepositoryError> {
        let excluded: Vec<&str> = exclude.iter().map(|s| s.as_str()).collect();

        let rows = sqlx::query_as::<_, QueueRow>(
            r"
            SELECT q.id, q.person_id, q.barber_id, q.service, q.status, q.entered_at,
                   p.name AS person_name, p.phone AS person_phone
            FROM queue_entry q
            JOIN person p ON p.id = q.person_id
            WHERE q.barber_id = $1
              AND NOT (q.status::text = ANY($2))
            ORDER BY q.entered_at, q.id
            ",
        )
        .bind(barber_id)
        .bind(&excluded)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get one entry of a barber's queue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_barber(
        &self,
        entry_id: QueueEntryId,
        barber_id: PersonId,
    ) -> Result<Option<QueueRow>, RepositoryError> {
        let row = sqlx::query_as::<_, QueueRow>(
            r"
            SELECT q.id, q.person_id, q.barber_id, q.service, q.status, q.entered_at,
                   p.name AS person_name, p.phone AS person_phone
            FROM queue_entry q
            JOIN person p ON p.id = q.person_id
            WHERE q.id = $1 AND q.barber_id = $2
            ",
        )
        .bind(entry_id)
        .bind(barber_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Active entries of a person across all barbers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_for_person(
        &self,
        person_id: PersonId,
    ) -> Result<Vec<QueueRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, QueueRow>(
            r"
            SELECT q.id, q.person_id, q.barber_id, q.service, q.status, q.entered_at,
                   p.name AS person_name, p.phone AS person_phone
            FROM queue_entry q
            JOIN person p ON p.id = q.person_id
            WHERE q.person_id = $1
              AND q.status IN ('waiting', 'in_service')
            ORDER BY q.entered_at, q.id
            ",
        )
        .bind(person_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Upsert the client and put them in the barber's queue.
    ///
    /// Name and phone are merged only where the stored person has none. When
    /// the client already has an active entry with this barber, nothing is
    /// inserted and that entry is returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the phone belongs to another client.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn join(
        &self,
        client: &NewClient,
        barber_id: PersonId,
        service: &str,
    ) -> Result<JoinOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let person = sqlx::query_as::<_, Person>(
            r"
            INSERT INTO person (external_id, name, phone, role)
            VALUES ($1, $2, $3, 'client')
            ON CONFLICT (external_id) WHERE external_id IS NOT NULL DO UPDATE
            SET name = COALESCE(person.name, EXCLUDED.name),
                phone = COALESCE(person.phone, EXCLUDED.phone),
                updated_at = now()
            RETURNING id, name, phone, email, external_id, role, created_at, updated_at
            ",
        )
        .bind(&client.external_id)
        .bind(client.name.as_deref())
        .bind(client.phone.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "phone"))?;

        let inserted: Option<QueueEntryId> = sqlx::query_scalar(
            r"
            INSERT INTO queue_entry (person_id, barber_id, service)
            VALUES ($1, $2, $3)
            ON CONFLICT (person_id, barber_id) WHERE status IN ('waiting', 'in_service')
            DO NOTHING
            RETURNING id
            ",
        )
        .bind(person.id)
        .bind(barber_id)
        .bind(service)
        .fetch_optional(&mut *tx)
        .await?;

        let (entry_id, created) = match inserted {
            Some(id) => (id, true),
            None => {
                let existing: QueueEntryId = sqlx::query_scalar(
                    r"
                    SELECT id FROM queue_entry
                    WHERE person_id = $1 AND barber_id = $2
                      AND status IN ('waiting', 'in_service')
                    ",
                )
                .bind(person.id)
                .bind(barber_id)
                .fetch_one(&mut *tx)
                .await?;
                (existing, false)
            }
        };

        tx.commit().await?;

        Ok(JoinOutcome {
            client: person,
            entry_id,
            created,
        })
    }

    /// Move an entry from `from` to `to` if it still has status `from`.
    ///
    /// Returns `None` when the entry is missing, belongs to another barber, or
    /// its status changed since it was read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn compare_and_set_status(
        &self,
        entry_id: QueueEntryId,
        barber_id: PersonId,
        from: QueueStatus,
        to: QueueStatus,
    ) -> Result<Option<QueueRow>, RepositoryError> {
        let row = sqlx::query_as::<_, QueueRow>(
            r"
            WITH updated AS (
                UPDATE queue_entry
                SET status = $4, updated_at = now()
                WHERE id = $1 AND barber_id = $2 AND status = $3
                RETURNING id, person_id, barber_id, service, status, entered_at
            )
            SELECT u.id, u.person_id, u.barber_id, u.service, u.status, u.entered_at,
                   p.name AS person_name, p.phone AS person_phone
            FROM updated u
            JOIN person p ON p.id = u.person_id
            ",
        )
        .bind(entry_id)
        .bind(barber_id)
        .bind(from)
        .bind(to)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Delete an entry and, if no longer referenced, its client.
    ///
    /// Returns the number of persons deleted (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the barber has no such entry.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn remove(
        &self,
        entry_id: QueueEntryId,
        barber_id: PersonId,
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let person_id: PersonId = sqlx::query_scalar(
            r"
            DELETE FROM queue_entry
            WHERE id = $1 AND barber_id = $2
            RETURNING person_id
            ",
        )
        .bind(entry_id)
        .bind(barber_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let persons = delete_orphan_clients(&mut tx, &[person_id.as_i32()]).await?;

        tx.commit().await?;
        Ok(persons)
    }

    /// Delete every entry of a barber's queue and the clients left without
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn clear(&self, barber_id: PersonId) -> Result<ClearedQueue, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let person_ids: Vec<i32> = sqlx::query_scalar(
            r"
            DELETE FROM queue_entry
            WHERE barber_id = $1
            RETURNING person_id
            ",
        )
        .bind(barber_id)
        .fetch_all(&mut *tx)
        .await?;

        let entries = u64::try_from(person_ids.len()).unwrap_or(u64::MAX);
        let persons = if person_ids.is_empty() {
            0
        } else {
            delete_orphan_clients(&mut tx, &person_ids).await?
        };

        tx.commit().await?;
        Ok(ClearedQueue { entries, persons })
    }
}

/// Delete client persons from `ids` that have no queue entries left.
async fn delete_orphan_clients(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ids: &[i32],
) -> Result<u64, RepositoryError> {
    let result = sqlx::query(
        r"
        DELETE FROM person p
        WHERE p.id = ANY($1)
          AND p.role = 'client'
          AND NOT EXISTS (SELECT 1 FROM queue_entry q WHERE q.person_id = p.id)
        ",
    )
    .bind(ids)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}
