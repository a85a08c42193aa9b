//! Queue ordering and position engine.
//!
//! A barber's queue is the list of their entries ordered by entry time, with
//! ties broken by insertion order. Only *active* entries (`waiting`,
//! `in_service`) have a position; position 1 is the next client to be served
//! (or the one currently in the chair).
//!
//! Everything here is pure: the server loads rows and hands them over.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{PersonId, QueueEntryId, QueueStatus};

/// One ticket in a barber's waiting line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Entry ID (assigned in insertion order).
    pub id: QueueEntryId,
    /// The client waiting in line.
    pub person_id: PersonId,
    /// The barber whose queue this is.
    pub barber_id: PersonId,
    /// Requested service, free text.
    pub service: String,
    /// Current status.
    pub status: QueueStatus,
    /// When the client joined.
    pub entered_at: DateTime<Utc>,
}

/// Sort entries by entry time; equal timestamps fall back to the entry ID,
/// which follows insertion order.
pub fn order_queue(entries: &mut [QueueEntry]) {
    entries.sort_by_key(|entry| (entry.entered_at, entry.id));
}

/// Entries of `queue` whose status is not in `exclude`, in queue order.
#[must_use]
pub fn without_statuses(queue: &[QueueEntry], exclude: &[QueueStatus]) -> Vec<QueueEntry> {
    let mut kept: Vec<QueueEntry> = queue
        .iter()
        .filter(|entry| !exclude.contains(&entry.status))
        .cloned()
        .collect();
    order_queue(&mut kept);
    kept
}

/// The person's current entry: the most recently entered active one.
///
/// `entries` may span several barbers. Returns `None` when the person is not
/// in any queue.
#[must_use]
pub fn locate_active(entries: &[QueueEntry]) -> Option<&QueueEntry> {
    entries
        .iter()
        .filter(|entry| entry.status.is_active())
        .max_by_key(|entry| (entry.entered_at, entry.id))
}

/// 1-based rank of `entry_id` among the active entries of `queue`.
///
/// `queue` is the full queue of one barber (any statuses, any order). Returns
/// `None` when the entry is absent or no longer active.
#[must_use]
pub fn compute_position(entry_id: QueueEntryId, queue: &[QueueEntry]) -> Option<u32> {
    let active = without_statuses(queue, &[QueueStatus::Done, QueueStatus::Cancelled]);
    active
        .iter()
        .position(|entry| entry.id == entry_id)
        .and_then(|index| u32::try_from(index + 1).ok())
}

/// Positions for every entry of an ordered queue, aligned with the input.
///
/// Inactive entries get `None`; active ones are numbered from 1 in the order
/// given.
#[must_use]
pub fn positions(ordered_queue: &[QueueEntry]) -> Vec<Option<u32>> {
    let mut next = 0u32;
    ordered_queue
        .iter()
        .map(|entry| {
            entry.status.is_active().then(|| {
                next += 1;
                next
            })
        })
        .collect()
}
