//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error renders as `{"error": <kind>, "message": <text>}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{GoogleError, IdentityError, QueueError};

/// Application-level error type for the queue server.
#[derive(Debug, Error)]
pub enum AppError {
    /// No valid credentials on the request.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Signed in, but not as a barber.
    #[error("Not a barber")]
    NotBarber,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or malformed request input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Status move not allowed.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Client cannot be contacted.
    #[error("Missing contact")]
    MissingContact,

    /// Uniqueness violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// An external provider failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'a str,
}

impl AppError {
    /// Stable machine-readable kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::NotBarber => "not_barber",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::MissingContact => "missing_contact",
            Self::Conflict(_) => "conflict",
            Self::RateLimited => "rate_limited",
            Self::Upstream(_) => "upstream",
            Self::Database(_) | Self::Internal(_) => "internal",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NotBarber => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::InvalidTransition(_) | Self::MissingContact => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_) | Self::Upstream(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Upstream(_) => "External service error".to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::InvalidInput(msg) | Self::InvalidTransition(msg) | Self::Conflict(msg) => {
                msg.clone()
            }
            Self::Unauthenticated => "Missing or invalid credentials".to_string(),
            Self::NotBarber => "Barber account required".to_string(),
            Self::MissingContact => "Client has no phone number".to_string(),
            Self::RateLimited => "Too many requests".to_string(),
        };

        let body = ErrorBody {
            error: self.kind(),
            message: &message,
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::MissingField(field) => Self::InvalidInput(format!("{field} is required")),
            QueueError::InvalidInput(msg) => Self::InvalidInput(msg),
            QueueError::InvalidEmail(e) => Self::InvalidInput(format!("invalid email: {e}")),
            QueueError::NotFound(what) => Self::NotFound(what.to_string()),
            QueueError::NotBarber => Self::NotBarber,
            QueueError::InvalidTransition(e) => Self::InvalidTransition(e.to_string()),
            QueueError::MissingContact(_) => Self::MissingContact,
            QueueError::Conflict(msg) => Self::Conflict(msg),
            QueueError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Unauthenticated => Self::Unauthenticated,
            IdentityError::Upstream(msg) => Self::Upstream(msg),
            IdentityError::Http(e) => Self::Upstream(e.to_string()),
        }
    }
}

impl From<GoogleError> for AppError {
    fn from(err: GoogleError) -> Self {
        match err {
            GoogleError::UnverifiedEmail => Self::Unauthenticated,
            GoogleError::OAuth(msg) => Self::Upstream(msg),
            GoogleError::Http(e) => Self::Upstream(e.to_string()),
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session error: {err}"))
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a person ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(person_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(person_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
