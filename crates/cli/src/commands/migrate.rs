//! Database migration command.
//!
//! Applies the embedded schema migrations from `crates/server/migrations/`
//! and creates the barber session table.

use barberq_server::{db, middleware};

use super::{CommandError, connect};

/// Run all migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running schema migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Creating session table...");
    middleware::create_session_store(&pool)
        .migrate()
        .await
        .map_err(|e| CommandError::SessionStore(e.to_string()))?;

    tracing::info!("Migrations complete!");
    Ok(())
}
