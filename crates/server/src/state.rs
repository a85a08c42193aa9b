//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::{FirebaseVerifier, GoogleOAuthClient, IdentityVerifier, QueueService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    identity: Arc<dyn IdentityVerifier>,
    google: GoogleOAuthClient,
}

impl AppState {
    /// Create a new application state verifying clients through Firebase.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let identity = Arc::new(FirebaseVerifier::new(config.firebase_api_key.clone()));
        Self::with_identity(config, pool, identity)
    }

    /// Create a new application state with a custom identity verifier.
    #[must_use]
    pub fn with_identity(
        config: ServerConfig,
        pool: PgPool,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Self {
        let google = GoogleOAuthClient::new(&config.google);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                identity,
                google,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the client identity verifier.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityVerifier {
        self.inner.identity.as_ref()
    }

    /// Get the Google OAuth client.
    #[must_use]
    pub fn google(&self) -> &GoogleOAuthClient {
        &self.inner.google
    }

    /// Queue service bound to this state's pool and settings.
    #[must_use]
    pub fn queue(&self) -> QueueService<'_> {
        QueueService::new(&self.inner.pool, &self.inner.config.queue)
    }

    /// Suggested polling interval for list responses, in seconds.
    #[must_use]
    pub fn poll_interval_secs(&self) -> u64 {
        self.inner.config.queue.poll_interval.as_secs()
    }
}
