//! HTTP route handlers for the queue server.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                         - Liveness
//! GET    /health/ready                   - Readiness (database)
//!
//! # Barber sign-in (Google)
//! GET    /auth/google/login              - Redirect to Google
//! GET    /auth/google/callback           - Handle OAuth callback
//! POST   /auth/logout                    - End barber session
//!
//! # Barber panel (session)
//! GET    /api/session                    - Signed-in barber
//! GET    /api/barber/queue               - Queue (cancelled omitted)
//! DELETE /api/barber/queue               - Clear queue
//! PATCH  /api/barber/queue/{id}          - Change status
//! DELETE /api/barber/queue/{id}          - Remove entry
//! POST   /api/barber/queue/{id}/notify   - WhatsApp links
//!
//! # Clients (bearer token)
//! POST   /api/queue/join                 - Join a barber's queue
//! GET    /api/queue/me                   - Own entry and position
//! GET    /api/profile                    - Own person record
//! POST   /api/barbers/register           - Register as barber
//!
//! # Public
//! GET    /api/public/queue?barber=EMAIL  - Waiting-room screen
//! ```

pub mod auth;
pub mod barber;
pub mod client;
pub mod health;
pub mod public;

use axum::{
    Router,
    http::{StatusCode, header},
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::Serialize;

use barberq_core::QueueEntryId;

use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, join_rate_limiter};
use crate::state::AppState;

/// A queue listing plus how long clients should wait before polling again.
#[derive(Debug, Serialize)]
pub struct Listing<T> {
    pub queue: Vec<T>,
    pub poll_interval_secs: u64,
}

impl<T> Listing<T> {
    #[must_use]
    pub fn new(queue: Vec<T>, state: &AppState) -> Self {
        Self {
            queue,
            poll_interval_secs: state.poll_interval_secs(),
        }
    }
}

/// Parse a queue entry ID from a path segment.
fn parse_entry_id(raw: &str) -> Result<QueueEntryId, AppError> {
    raw.parse()
        .map_err(|_| AppError::InvalidInput(format!("invalid queue entry id: {raw}")))
}

/// Give limiter rejections the same JSON body as every other error, keeping
/// its retry headers.
async fn rate_limited_body(response: Response) -> Response {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    let mut rewritten = AppError::RateLimited.into_response();
    for (name, value) in response.headers() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rewritten.headers_mut().insert(name.clone(), value.clone());
        }
    }
    rewritten
}

/// Create the full application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/api", api_routes())
}

/// Create the barber sign-in routes router.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/google/login", get(auth::login))
        .layer(auth_rate_limiter())
        .layer(map_response(rate_limited_body));

    Router::new()
        .route("/google/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
        .merge(limited)
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    let join = Router::new()
        .route("/queue/join", post(client::join))
        .layer(join_rate_limiter())
        .layer(map_response(rate_limited_body));
    let register = Router::new()
        .route("/barbers/register", post(client::register_barber))
        .layer(auth_rate_limiter())
        .layer(map_response(rate_limited_body));

    Router::new()
        .route("/session", get(auth::current))
        .route("/barber/queue", get(barber::list).delete(barber::clear))
        .route(
            "/barber/queue/{id}",
            patch(barber::update_status).delete(barber::remove),
        )
        .route("/barber/queue/{id}/notify", post(barber::notify))
        .route("/queue/me", get(client::me))
        .route("/profile", get(client::profile))
        .route("/public/queue", get(public::queue))
        .merge(join)
        .merge(register)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::test_config;
    use crate::services::identity::testing::StaticVerifier;

    const TOKEN: &str = "valid-test-token";

    /// App wired like production, with a pool that never connects unless a
    /// handler reaches the database.
    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/barberq_test")
            .unwrap();
        let state = AppState::with_identity(
            test_config(),
            pool.clone(),
            Arc::new(StaticVerifier::client(TOKEN)),
        );
        let session_layer = crate::middleware::create_session_layer(
            crate::middleware::create_session_store(&pool),
            state.config(),
        );
        crate::app(state, session_layer)
    }

    fn request(method: &str, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "198.51.100.7")
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_parse_entry_id() {
        assert_eq!(parse_entry_id("12").unwrap(), QueueEntryId::new(12));
        assert!(parse_entry_id("0").is_err());
        assert!(parse_entry_id("abc").is_err());
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(request("GET", "/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let response = app()
            .oneshot(
                request("GET", "/health")
                    .header("x-request-id", "edge-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "edge-42");
    }

    #[tokio::test]
    async fn test_barber_routes_require_session() {
        for (method, uri) in [
            ("GET", "/api/barber/queue"),
            ("DELETE", "/api/barber/queue"),
            ("DELETE", "/api/barber/queue/3"),
            ("GET", "/api/session"),
        ] {
            let response = app()
                .oneshot(request(method, uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(json(response).await["error"], "unauthenticated");
        }
    }

    #[tokio::test]
    async fn test_client_routes_require_bearer() {
        let response = app()
            .oneshot(
                request("POST", "/api/queue/join")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"barber_email":"ze@barbearia.com","service":"Corte"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app()
            .oneshot(
                request("GET", "/api/queue/me")
                    .header(header::AUTHORIZATION, "Bearer forged")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json(response).await["error"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_join_validates_before_touching_database() {
        let cases = [
            (r#"{"barber_email":"ze@barbearia.com"}"#, "service is required"),
            (r#"{"service":"Corte"}"#, "barber_email is required"),
            (r#"{"barber_email":"  ","service":"Corte"}"#, "barber_email is required"),
        ];
        for (body, message) in cases {
            let response = app()
                .oneshot(
                    request("POST", "/api/queue/join")
                        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            let json = json(response).await;
            assert_eq!(json["error"], "invalid_input");
            assert_eq!(json["message"], message);
        }
    }

    #[tokio::test]
    async fn test_join_rejects_malformed_email() {
        let response = app()
            .oneshot(
                request("POST", "/api/queue/join")
                    .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"barber_email":"ze.barbearia","service":"Corte"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_join_rejects_non_json_body() {
        let response = app()
            .oneshot(
                request("POST", "/api/queue/join")
                    .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("service=Corte"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"], "invalid_input");
    }

    #[tokio::test]
    async fn test_join_over_limit_is_rate_limited_json() {
        let app = app();
        let join = || {
            request("POST", "/api/queue/join")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap()
        };

        // Burst of 10; unauthenticated calls still count
        for _ in 0..10 {
            let response = app.clone().oneshot(join()).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        let response = app.oneshot(join()).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(json(response).await["error"], "rate_limited");
    }

    #[tokio::test]
    async fn test_rate_limited_body_passes_other_responses() {
        let response = rate_limited_body(StatusCode::UNAUTHORIZED.into_response()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let limited = Response::builder()
            .status(StatusCode::TOO_MANY_REQUESTS)
            .header("retry-after", "2")
            .body(axum::body::Body::from("Too Many Requests! Wait for 2s"))
            .unwrap();
        let response = rate_limited_body(limited).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "2");
        assert_eq!(json(response).await["message"], "Too many requests");
    }

    #[tokio::test]
    async fn test_public_queue_requires_barber_param() {
        for uri in ["/api/public/queue", "/api/public/queue?barber=nobody"] {
            let response = app()
                .oneshot(request("GET", uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(json(response).await["error"], "invalid_input");
        }
    }
}
