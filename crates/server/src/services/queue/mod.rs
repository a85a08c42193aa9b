//! Queue service.
//!
//! Validates requests, resolves people, and runs queue mutations through the
//! repositories. Positions are computed by `barberq_core::queue` from the rows
//! the repository returns.

mod error;

pub use error::QueueError;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use barberq_core::{
    Email, NotifyLinks, PersonId, QueueEntry, QueueEntryId, QueueStatus, TransitionError,
    build_notify_links, compute_position, locate_active, positions,
};

use crate::config::QueueConfig;
use crate::db::{ClearedQueue, NewClient, PersonRepository, QueueRepository};
use crate::models::{ClientSnapshot, CurrentBarber, Person, PublicQueueItem, QueueItem, QueueRow};
use crate::services::identity::VerifiedIdentity;

/// Longest accepted service description.
const MAX_SERVICE_CHARS: usize = 120;

/// Longest accepted display name.
const MAX_NAME_CHARS: usize = 80;

/// Statuses hidden from barber and public listings.
const HIDDEN_FROM_LISTS: [QueueStatus; 1] = [QueueStatus::Cancelled];

/// Statuses that do not count toward a position.
const INACTIVE: [QueueStatus; 2] = [QueueStatus::Done, QueueStatus::Cancelled];

/// Body of `POST /api/queue/join`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinRequest {
    pub barber_email: Option<String>,
    pub service: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// What a join did.
#[derive(Debug, Clone, Serialize)]
pub struct JoinResult {
    pub entry_id: QueueEntryId,
    /// `false` when the client was already in this barber's queue.
    pub created: bool,
    pub position: Option<u32>,
}

/// Body of `POST /api/barber/queue/{id}/notify`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Body of `POST /api/barbers/register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Queue service.
pub struct QueueService<'a> {
    persons: PersonRepository<'a>,
    queue: QueueRepository<'a>,
    settings: &'a QueueConfig,
}

impl<'a> QueueService<'a> {
    /// Create a new queue service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, settings: &'a QueueConfig) -> Self {
        Self {
            persons: PersonRepository::new(pool),
            queue: QueueRepository::new(pool),
            settings,
        }
    }

    // =========================================================================
    // Clients
    // =========================================================================

    /// Put the caller in a barber's queue.
    ///
    /// Joining again while an entry is active is a no-op that reports the
    /// existing entry.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::MissingField` for an empty service or barber
    /// address, `QueueError::InvalidEmail` for a malformed one, and
    /// `QueueError::NotFound` if no barber has that email.
    pub async fn join(
        &self,
        identity: &VerifiedIdentity,
        request: JoinRequest,
    ) -> Result<JoinResult, QueueError> {
        let barber_email = required(request.barber_email.as_deref(), "barber_email")?;
        let service = required(request.service.as_deref(), "service")?;
        if service.chars().count() > MAX_SERVICE_CHARS {
            return Err(QueueError::InvalidInput(format!(
                "service must be at most {MAX_SERVICE_CHARS} characters"
            )));
        }
        let barber_email = Email::parse(barber_email)?;
        let barber = self.barber_by_email(&barber_email).await?;

        let client = NewClient {
            external_id: identity.uid.clone(),
            name: display_name(request.name.as_deref(), identity.display_name.as_deref())?,
            // A provider-verified number wins over a typed one
            phone: identity
                .phone
                .clone()
                .or_else(|| optional(request.phone.as_deref()).map(str::to_owned)),
        };

        let outcome = self.queue.join(&client, barber.id, service).await?;

        let rows = self.queue.list_for_barber(barber.id, &INACTIVE).await?;
        let entries: Vec<QueueEntry> = rows.iter().map(QueueRow::entry).collect();
        let position = compute_position(outcome.entry_id, &entries);

        tracing::info!(
            entry_id = %outcome.entry_id,
            client_id = %outcome.client.id,
            barber_id = %barber.id,
            created = outcome.created,
            position = ?position,
            "Client joined queue"
        );

        Ok(JoinResult {
            entry_id: outcome.entry_id,
            created: outcome.created,
            position,
        })
    }

    /// The caller's current entry, its position and the queue around it.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Repository` if a query fails.
    pub async fn client_snapshot(
        &self,
        identity: &VerifiedIdentity,
    ) -> Result<ClientSnapshot, QueueError> {
        let Some(person) = self.persons.get_by_external_id(&identity.uid).await? else {
            return Ok(ClientSnapshot::not_in_queue());
        };

        let mine: Vec<QueueEntry> = self
            .queue
            .active_for_person(person.id)
            .await?
            .iter()
            .map(QueueRow::entry)
            .collect();
        let Some(current) = locate_active(&mine) else {
            return Ok(ClientSnapshot::not_in_queue());
        };

        let queue = self.public_items(current.barber_id, &INACTIVE).await?;
        let entry = queue.iter().find(|item| item.id == current.id).cloned();
        let position = entry.as_ref().and_then(|item| item.position);

        Ok(ClientSnapshot {
            entry,
            position,
            queue,
        })
    }

    /// The queue of the barber with `barber_email`, without contact details.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::MissingField` if no email is given,
    /// `QueueError::NotFound` if no barber has it.
    pub async fn public_queue(
        &self,
        barber_email: Option<&str>,
    ) -> Result<Vec<PublicQueueItem>, QueueError> {
        let barber_email = Email::parse(required(barber_email, "barber")?)?;
        let barber = self.barber_by_email(&barber_email).await?;
        self.public_items(barber.id, &HIDDEN_FROM_LISTS).await
    }

    /// The caller's person record.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::NotFound` if the caller never joined or registered.
    pub async fn profile(&self, identity: &VerifiedIdentity) -> Result<Person, QueueError> {
        self.persons
            .get_by_external_id(&identity.uid)
            .await?
            .ok_or(QueueError::NotFound("person"))
    }

    /// Register the caller as a barber.
    ///
    /// Returns the person and whether it was created.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::InvalidEmail` for a malformed email and
    /// `QueueError::Conflict` if the email belongs to someone else.
    pub async fn register_barber(
        &self,
        identity: &VerifiedIdentity,
        request: RegisterRequest,
    ) -> Result<(Person, bool), QueueError> {
        let email = optional(request.email.as_deref())
            .or(identity.email.as_deref())
            .map(Email::parse)
            .transpose()?;
        let name = display_name(request.name.as_deref(), identity.display_name.as_deref())?;

        let (person, created) = self
            .persons
            .register_barber(&identity.uid, name.as_deref(), email.as_ref())
            .await?;

        if created {
            tracing::info!(person_id = %person.id, "Barber registered");
        }
        Ok((person, created))
    }

    // =========================================================================
    // Barbers
    // =========================================================================

    /// Confirm that the session's barber still exists as a barber.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::NotBarber` otherwise.
    pub async fn resolve_barber(&self, current: &CurrentBarber) -> Result<PersonId, QueueError> {
        match self.persons.get_by_id(current.id).await? {
            Some(person) if person.is_barber() => Ok(person.id),
            _ => Err(QueueError::NotBarber),
        }
    }

    /// The barber's queue in order, cancelled entries omitted.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Repository` if the query fails.
    pub async fn barber_queue(&self, barber_id: PersonId) -> Result<Vec<QueueItem>, QueueError> {
        let rows = self.queue.list_for_barber(barber_id, &HIDDEN_FROM_LISTS).await?;
        Ok(with_positions(rows, QueueItem::from_row))
    }

    /// Move an entry to `status`.
    ///
    /// The write only succeeds if the entry still has the status it was read
    /// with; a concurrent change is reported as an invalid transition.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::NotFound` if the barber has no such entry and
    /// `QueueError::InvalidTransition` if the move is not allowed.
    pub async fn transition(
        &self,
        barber_id: PersonId,
        entry_id: QueueEntryId,
        status: QueueStatus,
    ) -> Result<QueueItem, QueueError> {
        let current = self
            .queue
            .get_for_barber(entry_id, barber_id)
            .await?
            .ok_or(QueueError::NotFound("queue entry"))?;
        current.status.transition(status)?;

        let updated = self
            .queue
            .compare_and_set_status(entry_id, barber_id, current.status, status)
            .await?;

        let Some(row) = updated else {
            // Lost a race: report against what is stored now
            let now = self
                .queue
                .get_for_barber(entry_id, barber_id)
                .await?
                .ok_or(QueueError::NotFound("queue entry"))?;
            return Err(TransitionError {
                from: now.status,
                to: status,
            }
            .into());
        };

        tracing::info!(
            entry_id = %entry_id,
            from = %current.status,
            to = %status,
            "Queue entry status changed"
        );

        let active: Vec<QueueEntry> = self
            .queue
            .list_for_barber(barber_id, &INACTIVE)
            .await?
            .iter()
            .map(QueueRow::entry)
            .collect();
        let position = compute_position(entry_id, &active);
        Ok(QueueItem::from_row(row, position))
    }

    /// Delete an entry (and its client, if they have no other entries).
    ///
    /// # Errors
    ///
    /// Returns `QueueError::NotFound` if the barber has no such entry.
    pub async fn remove(
        &self,
        barber_id: PersonId,
        entry_id: QueueEntryId,
    ) -> Result<(), QueueError> {
        let persons = self
            .queue
            .remove(entry_id, barber_id)
            .await
            .map_err(|e| match e {
                crate::db::RepositoryError::NotFound => QueueError::NotFound("queue entry"),
                other => other.into(),
            })?;

        tracing::info!(entry_id = %entry_id, persons_deleted = persons, "Queue entry removed");
        Ok(())
    }

    /// Delete every entry of the barber's queue.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Repository` if a query fails.
    pub async fn clear(&self, barber_id: PersonId) -> Result<ClearedQueue, QueueError> {
        let cleared = self.queue.clear(barber_id).await?;
        tracing::info!(
            barber_id = %barber_id,
            entries = cleared.entries,
            persons = cleared.persons,
            "Queue cleared"
        );
        Ok(cleared)
    }

    /// WhatsApp links for calling an entry's client.
    ///
    /// Name and phone default to the stored client's.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::NotFound` if the barber has no such entry and
    /// `QueueError::MissingContact` if no phone is known.
    pub async fn notify(
        &self,
        barber_id: PersonId,
        entry_id: QueueEntryId,
        request: NotifyRequest,
    ) -> Result<NotifyLinks, QueueError> {
        let row = self
            .queue
            .get_for_barber(entry_id, barber_id)
            .await?
            .ok_or(QueueError::NotFound("queue entry"))?;

        let phone = optional(request.phone.as_deref()).or(row.person_phone.as_deref());
        let name = optional(request.name.as_deref()).or(row.person_name.as_deref());

        let links = build_notify_links(phone, name, &self.settings.phone_locale, &self.settings.shop_name)?;
        tracing::info!(entry_id = %entry_id, "Notification link generated");
        Ok(links)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn barber_by_email(&self, email: &Email) -> Result<Person, QueueError> {
        self.persons
            .get_by_email(email)
            .await?
            .filter(Person::is_barber)
            .ok_or(QueueError::NotFound("barber"))
    }

    async fn public_items(
        &self,
        barber_id: PersonId,
        exclude: &[QueueStatus],
    ) -> Result<Vec<PublicQueueItem>, QueueError> {
        let rows = self.queue.list_for_barber(barber_id, exclude).await?;
        Ok(with_positions(rows, PublicQueueItem::from_row))
    }
}

/// Pair each row (already in queue order) with its position.
fn with_positions<T>(rows: Vec<QueueRow>, view: impl Fn(QueueRow, Option<u32>) -> T) -> Vec<T> {
    let entries: Vec<QueueEntry> = rows.iter().map(QueueRow::entry).collect();
    rows.into_iter()
        .zip(positions(&entries))
        .map(|(row, position)| view(row, position))
        .collect()
}

/// Trimmed value, or `None` when absent or blank.
fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required<'v>(value: Option<&'v str>, field: &'static str) -> Result<&'v str, QueueError> {
    optional(value).ok_or(QueueError::MissingField(field))
}

/// Pick the typed name over the provider's, bounded in length.
fn display_name(typed: Option<&str>, provided: Option<&str>) -> Result<Option<String>, QueueError> {
    let Some(name) = optional(typed).or_else(|| optional(provided)) else {
        return Ok(None);
    };
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(QueueError::InvalidInput(format!(
            "name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(Some(name.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn row(id: i32, minute: u32, status: QueueStatus) -> QueueRow {
        QueueRow {
            id: QueueEntryId::new(id),
            person_id: PersonId::new(id + 100),
            barber_id: PersonId::new(1),
            service: "Corte".to_owned(),
            status,
            entered_at: Utc.with_ymd_and_hms(2026, 6, 1, 10, minute, 0).unwrap(),
            person_name: None,
            person_phone: None,
        }
    }

    #[test]
    fn test_required_rejects_blank() {
        assert!(matches!(
            required(Some("   "), "service"),
            Err(QueueError::MissingField("service"))
        ));
        assert!(matches!(
            required(None, "barber_email"),
            Err(QueueError::MissingField("barber_email"))
        ));
        assert_eq!(required(Some(" Corte "), "service").unwrap(), "Corte");
    }

    #[test]
    fn test_display_name_prefers_typed() {
        assert_eq!(
            display_name(Some("Bia"), Some("Beatriz")).unwrap().as_deref(),
            Some("Bia")
        );
        assert_eq!(
            display_name(Some(" "), Some("Beatriz")).unwrap().as_deref(),
            Some("Beatriz")
        );
        assert_eq!(display_name(None, None).unwrap(), None);
        assert!(display_name(Some(&"x".repeat(MAX_NAME_CHARS + 1)), None).is_err());
    }

    #[test]
    fn test_with_positions_skips_inactive() {
        let rows = vec![
            row(1, 0, QueueStatus::Done),
            row(2, 1, QueueStatus::InService),
            row(3, 2, QueueStatus::Waiting),
        ];
        let items = with_positions(rows, PublicQueueItem::from_row);
        let ranks: Vec<_> = items.iter().map(|i| i.position).collect();
        assert_eq!(ranks, vec![None, Some(1), Some(2)]);
    }

    #[test]
    fn test_join_request_accepts_partial_body() {
        let request: JoinRequest =
            serde_json::from_str(r#"{"barber_email":"ze@barbearia.com"}"#).unwrap();
        assert_eq!(request.barber_email.as_deref(), Some("ze@barbearia.com"));
        assert!(request.service.is_none());
    }
}
