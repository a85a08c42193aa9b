//! Session-related types.
//!
//! Types stored in the session for barber authentication state.

use serde::{Deserialize, Serialize};

use barberq_core::{Email, PersonId};

/// Session-stored barber identity.
///
/// Minimal data stored in the session to identify the signed-in barber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentBarber {
    /// Barber's person ID.
    pub id: PersonId,
    /// Barber's email address (queue address).
    pub email: Email,
    /// Display name from Google.
    pub name: Option<String>,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the signed-in barber.
    pub const CURRENT_BARBER: &str = "current_barber";

    /// Key for Google OAuth state (CSRF protection).
    pub const GOOGLE_OAUTH_STATE: &str = "google_oauth_state";

    /// Key for Google OAuth nonce (`OpenID` Connect replay protection).
    pub const GOOGLE_OAUTH_NONCE: &str = "google_oauth_nonce";
}
