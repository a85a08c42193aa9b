//! Queue rows and the views built from them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use barberq_core::{PersonId, QueueEntry, QueueEntryId, QueueStatus};

/// A queue entry joined with its client's display fields.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueueRow {
    pub id: QueueEntryId,
    pub person_id: PersonId,
    pub barber_id: PersonId,
    pub service: String,
    pub status: QueueStatus,
    pub entered_at: DateTime<Utc>,
    pub person_name: Option<String>,
    pub person_phone: Option<String>,
}

impl QueueRow {
    /// The domain entry, without display fields.
    #[must_use]
    pub fn entry(&self) -> QueueEntry {
        QueueEntry {
            id: self.id,
            person_id: self.person_id,
            barber_id: self.barber_id,
            service: self.service.clone(),
            status: self.status,
            entered_at: self.entered_at,
        }
    }
}

/// Queue entry as shown to the owning barber.
#[derive(Debug, Clone, Serialize)]
pub struct QueueItem {
    pub id: QueueEntryId,
    pub person_id: PersonId,
    pub service: String,
    pub status: QueueStatus,
    pub entered_at: DateTime<Utc>,
    /// 1-based rank among active entries; absent once done or cancelled.
    pub position: Option<u32>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
}

impl QueueItem {
    #[must_use]
    pub fn from_row(row: QueueRow, position: Option<u32>) -> Self {
        Self {
            id: row.id,
            person_id: row.person_id,
            service: row.service,
            status: row.status,
            entered_at: row.entered_at,
            position,
            client_name: row.person_name,
            client_phone: row.person_phone,
        }
    }
}

/// Queue entry as shown on the public page and to other clients.
///
/// Carries no contact details.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQueueItem {
    pub id: QueueEntryId,
    pub service: String,
    pub status: QueueStatus,
    pub entered_at: DateTime<Utc>,
    pub position: Option<u32>,
    pub client_name: Option<String>,
}

impl PublicQueueItem {
    #[must_use]
    pub fn from_row(row: QueueRow, position: Option<u32>) -> Self {
        Self {
            id: row.id,
            service: row.service,
            status: row.status,
            entered_at: row.entered_at,
            position,
            client_name: row.person_name,
        }
    }
}

/// A client's view of their own place in line.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSnapshot {
    /// The client's active entry, if any.
    pub entry: Option<PublicQueueItem>,
    /// Position of that entry.
    pub position: Option<u32>,
    /// Active entries of the same barber, in order.
    pub queue: Vec<PublicQueueItem>,
}

impl ClientSnapshot {
    /// Snapshot for a client who is not in any queue.
    #[must_use]
    pub const fn not_in_queue() -> Self {
        Self {
            entry: None,
            position: None,
            queue: Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn row() -> QueueRow {
        QueueRow {
            id: QueueEntryId::new(4),
            person_id: PersonId::new(9),
            barber_id: PersonId::new(1),
            service: "Barba".to_owned(),
            status: QueueStatus::Waiting,
            entered_at: Utc.with_ymd_and_hms(2026, 5, 2, 14, 0, 0).unwrap(),
            person_name: Some("Lia".to_owned()),
            person_phone: Some("+5511912345678".to_owned()),
        }
    }

    #[test]
    fn test_public_item_has_no_phone() {
        let json = serde_json::to_value(PublicQueueItem::from_row(row(), Some(1))).unwrap();
        assert!(json.get("client_phone").is_none());
        assert_eq!(json["client_name"], "Lia");
        assert_eq!(json["position"], 1);
        assert_eq!(json["status"], "waiting");
    }

    #[test]
    fn test_barber_item_keeps_phone() {
        let json = serde_json::to_value(QueueItem::from_row(row(), None)).unwrap();
        assert_eq!(json["client_phone"], "+5511912345678");
        assert!(json["position"].is_null());
    }

    #[test]
    fn test_entry_conversion() {
        let entry = row().entry();
        assert_eq!(entry.id, QueueEntryId::new(4));
        assert_eq!(entry.barber_id, PersonId::new(1));
    }
}
