//! Session middleware configuration.
//!
//! Barber sessions live in `PostgreSQL` via tower-sessions. Clients never get
//! a session; they authenticate every request with a bearer token.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::ServerConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "bq_session";

/// Idle time after which a barber must sign in again (12 hours).
const SESSION_IDLE_SECONDS: i64 = 12 * 60 * 60;

/// Create the `PostgreSQL` session store.
///
/// Call `migrate()` on the result once at startup to create its table.
#[must_use]
pub fn create_session_store(pool: &PgPool) -> PostgresStore {
    PostgresStore::new(pool.clone())
}

/// Create the session layer.
///
/// Cookies are `Secure` when the public URL is HTTPS.
#[must_use]
pub fn create_session_layer(
    store: PostgresStore,
    config: &ServerConfig,
) -> SessionManagerLayer<PostgresStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_IDLE_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
