//! Authentication extractors.
//!
//! Credentials are always passed explicitly to handlers:
//! - [`RequireBarber`] reads the barber identity from the session cookie.
//! - [`RequireIdentity`] verifies the client's bearer token.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentBarber, session_keys};
use crate::services::VerifiedIdentity;
use crate::services::identity::bearer_token;
use crate::state::AppState;

/// Extractor that requires a signed-in barber.
///
/// Rejects with `401 unauthenticated` when the session has no barber.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireBarber(barber): RequireBarber) -> String {
///     format!("Hello, {}!", barber.email)
/// }
/// ```
pub struct RequireBarber(pub CurrentBarber);

impl<S> FromRequestParts<S> for RequireBarber
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AppError::Unauthenticated)?;

        let barber: CurrentBarber = session
            .get(session_keys::CURRENT_BARBER)
            .await
            .ok()
            .flatten()
            .ok_or(AppError::Unauthenticated)?;

        set_sentry_user(&barber.id, Some(barber.email.as_str()));
        Ok(Self(barber))
    }
}

/// Extractor that requires a verified client identity token.
///
/// Rejects with `401 unauthenticated` for a missing or invalid token and
/// `502 upstream` when the identity provider is unreachable.
pub struct RequireIdentity(pub VerifiedIdentity);

impl FromRequestParts<AppState> for RequireIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthenticated)?;
        let identity = state.identity().verify(token).await?;
        Ok(Self(identity))
    }
}

/// Helper to set the signed-in barber in the session.
///
/// The session ID is cycled to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_barber(
    session: &Session,
    barber: &CurrentBarber,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_BARBER, barber).await
}

/// Helper to clear the signed-in barber from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_barber(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentBarber>(session_keys::CURRENT_BARBER)
        .await?;
    Ok(())
}
