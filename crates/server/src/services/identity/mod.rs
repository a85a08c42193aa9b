//! Client identity verification.
//!
//! Clients sign in with a phone number through Firebase Authentication and
//! send the resulting ID token as `Authorization: Bearer <token>`. The token
//! is checked against the Identity Toolkit `accounts:lookup` endpoint and the
//! result cached briefly, so a polling client costs one upstream call a minute.

mod error;

pub use error::IdentityError;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

const LOOKUP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:lookup";
const CACHE_TTL: Duration = Duration::from_secs(60);
const CACHE_CAPACITY: u64 = 10_000;

/// Identity established from a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// Provider subject, stable per account.
    pub uid: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Checks bearer tokens presented by clients.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token`, returning who presented it.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Unauthenticated` for any token that does not
    /// verify, and `Upstream`/`Http` when the provider cannot be reached.
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError>;
}

/// Extract the bearer token from request headers.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

// =============================================================================
// Firebase
// =============================================================================

/// Verifies Firebase ID tokens through the Identity Toolkit REST API.
#[derive(Clone)]
pub struct FirebaseVerifier {
    inner: Arc<FirebaseVerifierInner>,
}

struct FirebaseVerifierInner {
    client: reqwest::Client,
    api_key: SecretString,
    cache: Cache<String, VerifiedIdentity>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    phone_number: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
    #[serde(default)]
    disabled: bool,
}

impl From<LookupUser> for VerifiedIdentity {
    fn from(user: LookupUser) -> Self {
        Self {
            uid: user.local_id,
            phone: user.phone_number,
            email: user.email,
            display_name: user.display_name,
        }
    }
}

impl FirebaseVerifier {
    /// Create a verifier for the project owning `api_key`.
    #[must_use]
    pub fn new(api_key: SecretString) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(FirebaseVerifierInner {
                client: reqwest::Client::new(),
                api_key,
                cache,
            }),
        }
    }

    async fn lookup(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let url = format!(
            "{LOOKUP_URL}?key={}",
            urlencoding::encode(self.inner.api_key.expose_secret())
        );

        let response = self
            .inner
            .client
            .post(&url)
            .json(&LookupRequest { id_token: token })
            .send()
            .await?;

        let status = response.status();

        // INVALID_ID_TOKEN, TOKEN_EXPIRED, USER_NOT_FOUND all come back as 400
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Err(IdentityError::Unauthenticated);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "Identity provider returned non-success status"
            );
            return Err(IdentityError::Upstream(format!("HTTP {status}")));
        }

        let body: LookupResponse = response.json().await?;
        let user = body
            .users
            .into_iter()
            .next()
            .ok_or(IdentityError::Unauthenticated)?;

        if user.disabled {
            return Err(IdentityError::Unauthenticated);
        }

        Ok(user.into())
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        if let Some(identity) = self.inner.cache.get(token).await {
            return Ok(identity);
        }

        let identity = self.lookup(token).await?;
        tracing::debug!(uid = %identity.uid, "Verified identity token");

        self.inner
            .cache
            .insert(token.to_owned(), identity.clone())
            .await;
        Ok(identity)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Verifier accepting a single fixed token.
    pub struct StaticVerifier {
        pub token: &'static str,
        pub identity: VerifiedIdentity,
    }

    impl StaticVerifier {
        pub fn client(token: &'static str) -> Self {
            Self {
                token,
                identity: VerifiedIdentity {
                    uid: "firebase-uid-1".to_owned(),
                    phone: Some("+5511987654321".to_owned()),
                    email: None,
                    display_name: Some("Joana".to_owned()),
                },
            }
        }
    }

    #[async_trait]
    impl IdentityVerifier for StaticVerifier {
        async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
            if token == self.token {
                Ok(self.identity.clone())
            } else {
                Err(IdentityError::Unauthenticated)
            }
        }
    }
}
