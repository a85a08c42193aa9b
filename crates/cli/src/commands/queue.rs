//! Queue inspection and reset commands.

use barberq_core::{Email, PersonId};
use barberq_server::config::QueueConfig;
use barberq_server::db::PersonRepository;
use barberq_server::services::QueueService;
use sqlx::PgPool;

use super::{CommandError, connect};

async fn barber_id(pool: &PgPool, email: &str) -> Result<PersonId, CommandError> {
    let parsed = Email::parse(email).map_err(|e| CommandError::InvalidEmail(e.to_string()))?;
    match PersonRepository::new(pool).get_by_email(&parsed).await? {
        Some(person) if person.is_barber() => Ok(person.id),
        _ => Err(CommandError::UnknownBarber(email.to_owned())),
    }
}

/// Print a barber's queue in order.
pub async fn list(barber: &str) -> Result<(), CommandError> {
    let pool = connect().await?;
    let barber_id = barber_id(&pool, barber).await?;

    let settings = QueueConfig::default();
    let items = QueueService::new(&pool, &settings)
        .barber_queue(barber_id)
        .await?;

    #[allow(clippy::print_stdout)]
    {
        for item in &items {
            let position = item.position.map_or_else(|| "-".to_owned(), |p| p.to_string());
            println!(
                "{:>3}  #{:<6} {:<10} {:<24} {:<16} {}",
                position,
                item.id,
                item.status,
                item.client_name.as_deref().unwrap_or("-"),
                item.client_phone.as_deref().unwrap_or("-"),
                item.service,
            );
        }
        println!("{} entr(ies)", items.len());
    }
    Ok(())
}

/// Delete a barber's whole queue.
pub async fn clear(barber: &str) -> Result<(), CommandError> {
    let pool = connect().await?;
    let barber_id = barber_id(&pool, barber).await?;

    let settings = QueueConfig::default();
    let cleared = QueueService::new(&pool, &settings).clear(barber_id).await?;

    tracing::info!(
        "Queue cleared: {} entries and {} clients removed",
        cleared.entries,
        cleared.persons
    );
    Ok(())
}
