//! CLI subcommands.
//!
//! # Environment Variables
//!
//! - `BARBERQ_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

pub mod barber;
pub mod migrate;
pub mod queue;

use barberq_server::db::RepositoryError;
use barberq_server::services::QueueError;
use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No barber has this email.
    #[error("No barber with email: {0}")]
    UnknownBarber(String),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Session table could not be created.
    #[error("Session store error: {0}")]
    SessionStore(String),

    /// Repository query failed.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Queue operation failed.
    #[error("{0}")]
    Queue(#[from] QueueError),
}

/// Connect to the queue database named by the environment.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("BARBERQ_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("BARBERQ_DATABASE_URL"))?;

    tracing::info!("Connecting to queue database...");
    let pool = barberq_server::db::create_pool(&SecretString::from(database_url)).await?;
    Ok(pool)
}
