//! Integration tests for Barber Queue.
//!
//! These tests exercise the queue service against a real `PostgreSQL`
//! database and are ignored by default.
//!
//! # Running Tests
//!
//! ```bash
//! export BARBERQ_TEST_DATABASE_URL=postgres://localhost/barberq_test
//! cargo test -p barberq-integration-tests -- --ignored
//! ```
//!
//! Every test creates its own barber and clients with unique emails and
//! identity subjects, so tests can share one database and run in parallel.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::Router;
use barberq_core::{Email, PersonId};
use barberq_server::config::{GoogleConfig, QueueConfig, ServerConfig};
use barberq_server::db::{self, PersonRepository};
use barberq_server::middleware::{create_session_layer, create_session_store};
use barberq_server::models::{CurrentBarber, session_keys};
use barberq_server::services::{QueueService, VerifiedIdentity};
use barberq_server::state::AppState;
use secrecy::SecretString;
use sqlx::PgPool;
use tower_sessions::SessionStore;
use tower_sessions::cookie::time::{Duration, OffsetDateTime};
use tower_sessions::session::{Id, Record};

/// Shared state for one test.
pub struct TestContext {
    pub pool: PgPool,
    pub settings: QueueConfig,
}

impl TestContext {
    /// Connect to the test database and bring its schema up to date.
    ///
    /// # Panics
    ///
    /// Panics if `BARBERQ_TEST_DATABASE_URL` is unset or the database is
    /// unreachable.
    pub async fn new() -> Self {
        let url = std::env::var("BARBERQ_TEST_DATABASE_URL")
            .expect("BARBERQ_TEST_DATABASE_URL must be set for integration tests");
        let pool = db::create_pool(&SecretString::from(url))
            .await
            .expect("connect to test database");
        db::run_migrations(&pool).await.expect("run migrations");

        Self {
            pool,
            settings: QueueConfig::default(),
        }
    }

    /// Queue service bound to this context.
    #[must_use]
    pub fn service(&self) -> QueueService<'_> {
        QueueService::new(&self.pool, &self.settings)
    }

    /// Create a barber with a unique email.
    pub async fn barber(&self, name: &str) -> (PersonId, Email) {
        let email = Email::parse(&format!("barber-{}@barbearia.test", uuid::Uuid::new_v4()))
            .expect("generated email is valid");
        let person = PersonRepository::new(&self.pool)
            .upsert_barber(&email, Some(name), None)
            .await
            .expect("create barber");
        (person.id, email)
    }
}

impl TestContext {
    /// The HTTP app wired to this context's database.
    ///
    /// Client tokens are never verified against a real provider here; tests
    /// drive barber routes through [`TestContext::barber_cookie`].
    pub async fn app(&self) -> Router {
        let store = create_session_store(&self.pool);
        store.migrate().await.expect("create session table");

        let config = ServerConfig {
            database_url: SecretString::from("postgres://unused"),
            host: "127.0.0.1".parse().expect("valid ip"),
            port: 3000,
            base_url: "http://localhost:3000".to_owned(),
            google: GoogleConfig {
                client_id: "client-id.apps.googleusercontent.com".to_owned(),
                client_secret: SecretString::from("GOCSPX-integration_client_value"),
            },
            firebase_api_key: SecretString::from("AIzaSyIntegrationKey"),
            queue: self.settings.clone(),
            barber_panel_path: "/painel-barbeiro".to_owned(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };
        let session_layer = create_session_layer(store, &config);
        barberq_server::app(AppState::new(config, self.pool.clone()), session_layer)
    }

    /// A `Cookie` header value for a session signed in as this barber.
    pub async fn barber_cookie(&self, id: PersonId, email: &Email) -> String {
        let barber = CurrentBarber {
            id,
            email: email.clone(),
            name: None,
        };
        let record = Record {
            id: Id::default(),
            data: [(
                session_keys::CURRENT_BARBER.to_owned(),
                serde_json::to_value(&barber).expect("serialize barber"),
            )]
            .into_iter()
            .collect(),
            expiry_date: OffsetDateTime::now_utc() + Duration::hours(1),
        };
        create_session_store(&self.pool)
            .save(&record)
            .await
            .expect("store session");
        format!("bq_session={}", record.id)
    }
}

/// A verified client identity with a unique subject and phone.
#[must_use]
pub fn client(name: &str) -> VerifiedIdentity {
    let uid = uuid::Uuid::new_v4().simple().to_string();
    // Digits only, unique enough per run
    let digits: String = uid
        .bytes()
        .map(|b| char::from(b'0' + b % 10))
        .take(9)
        .collect();

    VerifiedIdentity {
        uid: format!("firebase:{uid}"),
        phone: Some(format!("+55119{digits}")),
        email: None,
        display_name: Some(name.to_owned()),
    }
}
