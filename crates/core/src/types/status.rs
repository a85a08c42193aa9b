//! Status and role enums.
//!
//! # Queue entry state machine
//!
//! ```text
//! waiting ──► in_service ──► done
//!    │
//!    └──────► cancelled
//! ```
//!
//! `done` and `cancelled` are terminal. Nothing leads back to `waiting`.

use serde::{Deserialize, Serialize};

/// Status of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "queue_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    /// In line, not yet called.
    #[default]
    Waiting,
    /// Sitting in the barber's chair.
    InService,
    /// Served.
    Done,
    /// Left the line before being served.
    Cancelled,
}

/// Error returned for a status move the state machine does not allow.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot move queue entry from {from} to {to}")]
pub struct TransitionError {
    /// Current status.
    pub from: QueueStatus,
    /// Requested status.
    pub to: QueueStatus,
}

impl QueueStatus {
    /// Whether the entry is still in line or being served.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Waiting | Self::InService)
    }

    /// Whether `self → next` is an allowed move.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Waiting, Self::InService | Self::Cancelled) | (Self::InService, Self::Done)
        )
    }

    /// Validate a move, returning the new status.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the move is not allowed.
    pub const fn transition(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }

    /// Database/wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InService => "in_service",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QueueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "in_service" => Ok(Self::InService),
            "done" => Ok(Self::Done),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid queue status: {s}")),
        }
    }
}

/// Role of a person record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "person_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PersonRole {
    /// Joins queues; addressed by phone.
    Client,
    /// Owns and manages one queue; addressed by email.
    Barber,
}

impl std::fmt::Display for PersonRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Barber => write!(f, "barber"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALL: [QueueStatus; 4] = [
        QueueStatus::Waiting,
        QueueStatus::InService,
        QueueStatus::Done,
        QueueStatus::Cancelled,
    ];

    #[test]
    fn test_allowed_transitions() {
        let allowed: Vec<_> = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();

        assert_eq!(
            allowed,
            vec![
                (QueueStatus::Waiting, QueueStatus::InService),
                (QueueStatus::Waiting, QueueStatus::Cancelled),
                (QueueStatus::InService, QueueStatus::Done),
            ]
        );
    }

    #[test]
    fn test_nothing_returns_to_waiting() {
        for from in ALL {
            assert!(!from.can_transition_to(QueueStatus::Waiting));
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in [QueueStatus::Done, QueueStatus::Cancelled] {
            assert!(!from.is_active());
            for to in ALL {
                assert!(from.transition(to).is_err());
            }
        }
    }

    #[test]
    fn test_transition_error_message() {
        let err = QueueStatus::Waiting
            .transition(QueueStatus::Done)
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot move queue entry from waiting to done");
    }

    #[test]
    fn test_wire_spelling_round_trips() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<QueueStatus>().unwrap(), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!("em_atendimento".parse::<QueueStatus>().is_err());
    }

    #[test]
    fn test_active_set() {
        assert!(QueueStatus::Waiting.is_active());
        assert!(QueueStatus::InService.is_active());
        assert!(!QueueStatus::Done.is_active());
        assert!(!QueueStatus::Cancelled.is_active());
        assert_eq!(QueueStatus::default(), QueueStatus::Waiting);
    }
}
