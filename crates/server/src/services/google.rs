//! Google OAuth client for barber sign-in.
//!
//! Authorization code flow with `OpenID` Connect scopes. Only the verified
//! email and display name are kept; Google tokens are never stored.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::config::GoogleConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Errors from the Google OAuth flow.
#[derive(Debug, Error)]
pub enum GoogleError {
    /// Token exchange or userinfo call rejected.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Google did not vouch for the email address.
    #[error("email address not verified")]
    UnverifiedEmail,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// The signed-in Google account.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUser {
    /// Google account subject.
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for Google's OAuth and userinfo endpoints.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    inner: Arc<GoogleOAuthClientInner>,
}

struct GoogleOAuthClientInner {
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
}

impl GoogleOAuthClient {
    /// Create a new Google OAuth client.
    #[must_use]
    pub fn new(config: &GoogleConfig) -> Self {
        Self {
            inner: Arc::new(GoogleOAuthClientInner {
                client: reqwest::Client::new(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
            }),
        }
    }

    /// Generate the authorization URL for barber login.
    ///
    /// # Arguments
    ///
    /// * `redirect_uri` - The callback URL registered with Google
    /// * `state` - A random string stored in the session to prevent CSRF attacks
    /// * `nonce` - A random string for `OpenID` Connect replay protection
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str, nonce: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope=openid%20email%20profile&\
            prompt=select_account&\
            state={}&\
            nonce={}",
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
            urlencoding::encode(nonce)
        )
    }

    /// Exchange an authorization code and fetch the account it belongs to.
    ///
    /// # Errors
    ///
    /// Returns `GoogleError::OAuth` if Google rejects the code or the token,
    /// `GoogleError::UnverifiedEmail` if the account email is unverified.
    pub async fn sign_in(&self, code: &str, redirect_uri: &str) -> Result<GoogleUser, GoogleError> {
        let access_token = self.exchange_code(code, redirect_uri).await?;
        let user = self.userinfo(&access_token).await?;

        if !user.email_verified {
            return Err(GoogleError::UnverifiedEmail);
        }
        Ok(user)
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, GoogleError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self.inner.client.post(TOKEN_URL).form(&params).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GoogleError::OAuth(format!("Token exchange failed: {text}")));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    async fn userinfo(&self, access_token: &str) -> Result<GoogleUser, GoogleError> {
        let response = self
            .inner
            .client
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GoogleError::OAuth(format!(
                "Userinfo request failed: HTTP {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoogleOAuthClient {
        GoogleOAuthClient::new(&GoogleConfig {
            client_id: "abc.apps.googleusercontent.com".to_owned(),
            client_secret: SecretString::from("GOCSPX-aB3xY9mK2nL5pQ7rT0uW4zC6"),
        })
    }

    #[test]
    fn test_authorization_url_encodes_params() {
        let url = client().authorization_url(
            "http://localhost:3000/auth/google/callback",
            "st/ate",
            "n once",
        );

        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=abc.apps.googleusercontent.com"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fgoogle%2Fcallback"));
        assert!(url.contains("state=st%2Fate"));
        assert!(url.contains("nonce=n%20once"));
        assert!(url.contains("scope=openid%20email%20profile"));
    }
}
