//! Identity verification error types.

use thiserror::Error;

/// Errors that can occur while verifying a client's identity token.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Token missing, malformed, expired or revoked.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The identity provider answered with something unexpected.
    #[error("identity provider error: {0}")]
    Upstream(String),

    /// HTTP request to the identity provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
