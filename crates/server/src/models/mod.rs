//! Domain models for the queue server.
//!
//! Rows loaded from `PostgreSQL` and the views returned to API clients.

pub mod person;
pub mod queue;
pub mod session;

pub use person::{Person, ProfileView};
pub use queue::{ClientSnapshot, PublicQueueItem, QueueItem, QueueRow};
pub use session::{CurrentBarber, keys as session_keys};
