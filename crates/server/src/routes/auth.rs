//! Barber sign-in with Google.
//!
//! - Login: stores state and nonce in the session, redirects to Google
//! - Callback: checks state, exchanges the code, upserts the barber and
//!   stores [`CurrentBarber`] in the session
//! - Logout: forgets the barber
//!
//! Failures redirect back to the barber panel with an `error` query parameter.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use tower_sessions::Session;

use barberq_core::Email;

use crate::db::PersonRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireBarber, clear_current_barber, set_current_barber};
use crate::models::{CurrentBarber, session_keys};
use crate::services::GoogleUser;
use crate::state::AppState;

/// Query parameters from the Google OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for tokens.
    pub code: Option<String>,
    /// State parameter for CSRF protection.
    pub state: Option<String>,
    /// Error code if the barber declined.
    pub error: Option<String>,
}

/// Generate a random alphanumeric string from the thread RNG.
fn random_token(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

fn panel_redirect(state: &AppState, error: &str) -> Response {
    let path = &state.config().barber_panel_path;
    Redirect::to(&format!("{path}?error={error}")).into_response()
}

/// Start Google sign-in.
///
/// # Route
///
/// `GET /auth/google/login`
pub async fn login(State(state): State<AppState>, session: Session) -> Response {
    let oauth_state = random_token(32);
    let nonce = random_token(32);

    if let Err(e) = session
        .insert(session_keys::GOOGLE_OAUTH_STATE, &oauth_state)
        .await
    {
        tracing::error!("Failed to store OAuth state in session: {}", e);
        return panel_redirect(&state, "session");
    }

    if let Err(e) = session.insert(session_keys::GOOGLE_OAUTH_NONCE, &nonce).await {
        tracing::error!("Failed to store OAuth nonce in session: {}", e);
        return panel_redirect(&state, "session");
    }

    let redirect_uri = state.config().google_redirect_uri();
    let auth_url = state
        .google()
        .authorization_url(&redirect_uri, &oauth_state, &nonce);

    Redirect::to(&auth_url).into_response()
}

/// Finish Google sign-in.
///
/// # Route
///
/// `GET /auth/google/callback`
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error {
        tracing::warn!(error = %error, "Google OAuth error");
        return panel_redirect(&state, "google_denied");
    }

    let Some(code) = query.code else {
        tracing::warn!("Google OAuth callback missing code");
        return panel_redirect(&state, "missing_code");
    };

    let stored_state: Option<String> = session
        .get(session_keys::GOOGLE_OAUTH_STATE)
        .await
        .ok()
        .flatten();

    // One-time use
    let _ = session
        .remove::<String>(session_keys::GOOGLE_OAUTH_STATE)
        .await;
    let _ = session
        .remove::<String>(session_keys::GOOGLE_OAUTH_NONCE)
        .await;

    if stored_state.is_none() || stored_state != query.state {
        tracing::warn!("Google OAuth state mismatch");
        return panel_redirect(&state, "invalid_state");
    }

    let redirect_uri = state.config().google_redirect_uri();
    let user = match state.google().sign_in(&code, &redirect_uri).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("Google sign-in failed: {}", e);
            return panel_redirect(&state, "sign_in");
        }
    };

    let barber = match upsert_barber(&state, &user).await {
        Ok(barber) => barber,
        Err(e) => {
            tracing::error!("Failed to record barber: {}", e);
            return panel_redirect(&state, "account");
        }
    };

    if let Err(e) = set_current_barber(&session, &barber).await {
        tracing::error!("Failed to store barber in session: {}", e);
        return panel_redirect(&state, "session");
    }

    set_sentry_user(&barber.id, Some(barber.email.as_str()));
    tracing::info!(barber_id = %barber.id, "Barber signed in");

    Redirect::to(&state.config().barber_panel_path).into_response()
}

async fn upsert_barber(state: &AppState, user: &GoogleUser) -> Result<CurrentBarber> {
    let email = Email::parse(&user.email)
        .map_err(|e| AppError::Upstream(format!("Google returned an invalid email: {e}")))?;
    let external_id = format!("google:{}", user.sub);

    let person = PersonRepository::new(state.pool())
        .upsert_barber(&email, user.name.as_deref(), Some(&external_id))
        .await?;

    Ok(CurrentBarber {
        id: person.id,
        email,
        name: person.name,
    })
}

/// End the barber session.
///
/// # Route
///
/// `POST /auth/logout`
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_barber(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in barber.
///
/// # Route
///
/// `GET /api/session`
pub async fn current(RequireBarber(barber): RequireBarber) -> Json<CurrentBarber> {
    Json(barber)
}
