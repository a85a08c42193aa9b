//! Queue operation error types.

use thiserror::Error;

use barberq_core::{EmailError, NotifyError, TransitionError};

use crate::db::RepositoryError;

/// Errors that can occur during queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// A required request field is empty or absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A request field is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Malformed barber email.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Barber, entry or person does not exist (or is not visible to the caller).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The signed-in account is not a barber.
    #[error("not a barber")]
    NotBarber,

    /// Status move not allowed from the entry's current status.
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// Client has no usable phone number.
    #[error(transparent)]
    MissingContact(#[from] NotifyError),

    /// Uniqueness violated (e.g. phone already used by another client).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for QueueError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::NotFound => Self::NotFound("record"),
            other => Self::Repository(other),
        }
    }
}
