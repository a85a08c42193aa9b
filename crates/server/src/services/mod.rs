//! Business logic services.

pub mod google;
pub mod identity;
pub mod queue;

pub use google::{GoogleError, GoogleOAuthClient, GoogleUser};
pub use identity::{FirebaseVerifier, IdentityError, IdentityVerifier, VerifiedIdentity};
pub use queue::{QueueError, QueueService};
