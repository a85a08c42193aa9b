//! Barber management commands.

use barberq_core::Email;
use barberq_server::db::PersonRepository;

use super::{CommandError, connect};

/// Create a barber, or promote the person who owns `email`.
///
/// The Google account with this email is linked on first sign-in.
pub async fn add(email: &str, name: Option<&str>) -> Result<(), CommandError> {
    let email = Email::parse(email).map_err(|e| CommandError::InvalidEmail(e.to_string()))?;
    let pool = connect().await?;

    let person = PersonRepository::new(&pool)
        .upsert_barber(&email, name, None)
        .await?;

    tracing::info!("Barber ready! ID: {}, Email: {}", person.id, email);
    Ok(())
}

/// Print every barber.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;
    let barbers = PersonRepository::new(&pool).list_barbers().await?;

    #[allow(clippy::print_stdout)]
    {
        for barber in &barbers {
            println!(
                "{:>6}  {:<32}  {}",
                barber.id,
                barber.email.as_ref().map_or("-", Email::as_str),
                barber.name.as_deref().unwrap_or("-"),
            );
        }
        println!("{} barber(s)", barbers.len());
    }
    Ok(())
}
