//! Barber Queue CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run schema migrations and create the session table
//! bq-cli migrate
//!
//! # Register a barber ahead of their first Google sign-in
//! bq-cli barber add -e ze@barbearia.com -n "Zé"
//!
//! # List barbers
//! bq-cli barber list
//!
//! # Show or clear a barber's queue
//! bq-cli queue list -b ze@barbearia.com
//! bq-cli queue clear -b ze@barbearia.com
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bq-cli")]
#[command(author, version, about = "Barber Queue CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage barbers
    Barber {
        #[command(subcommand)]
        action: BarberAction,
    },
    /// Inspect or reset queues
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
}

#[derive(Subcommand)]
enum BarberAction {
    /// Create a barber, or promote the person with this email
    Add {
        /// Barber email address
        #[arg(short, long)]
        email: String,

        /// Barber display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List barbers
    List,
}

#[derive(Subcommand)]
enum QueueAction {
    /// Print a barber's queue
    List {
        /// Barber email address
        #[arg(short, long)]
        barber: String,
    },
    /// Delete every entry of a barber's queue
    Clear {
        /// Barber email address
        #[arg(short, long)]
        barber: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Barber { action } => match action {
            BarberAction::Add { email, name } => {
                commands::barber::add(&email, name.as_deref()).await?;
            }
            BarberAction::List => commands::barber::list().await?,
        },
        Commands::Queue { action } => match action {
            QueueAction::List { barber } => commands::queue::list(&barber).await?,
            QueueAction::Clear { barber } => commands::queue::clear(&barber).await?,
        },
    }
    Ok(())
}
