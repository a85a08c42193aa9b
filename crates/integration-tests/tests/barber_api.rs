//! Integration tests for the barber panel API against `PostgreSQL`.
//!
//! Sessions are written straight into the session store, standing in for a
//! completed Google sign-in.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use barberq_core::Email;
use barberq_integration_tests::{TestContext, client};
use barberq_server::services::queue::JoinRequest;
use tower::ServiceExt;

fn join_request(barber: &Email) -> JoinRequest {
    JoinRequest {
        barber_email: Some(barber.as_str().to_owned()),
        service: Some("Corte".to_owned()),
        ..Default::default()
    }
}

fn patch_status(uri: &str, cookie: &str, status: &str) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(format!(r#"{{"status":"{status}"}}"#)))
        .unwrap()
}

async fn json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Status changes
// =============================================================================

#[tokio::test]
#[ignore = "requires database"]
async fn test_patch_moves_entry_through_service() {
    let ctx = TestContext::new().await;
    let (barber_id, email) = ctx.barber("Zé").await;
    let joined = ctx
        .service()
        .join(&client("Ana"), join_request(&email))
        .await
        .unwrap();
    let cookie = ctx.barber_cookie(barber_id, &email).await;
    let app = ctx.app().await;
    let uri = format!("/api/barber/queue/{}", joined.entry_id);

    let response = app
        .clone()
        .oneshot(patch_status(&uri, &cookie, "in_service"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["entry"]["status"], "in_service");
    assert_eq!(body["entry"]["position"], 1);

    let response = app
        .clone()
        .oneshot(patch_status(&uri, &cookie, "done"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["entry"]["status"], "done");
    assert!(body["entry"]["position"].is_null());

    let response = app
        .oneshot(patch_status(&uri, &cookie, "waiting"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json(response).await["error"], "invalid_transition");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_patch_cancel_returns_cancelled_entry() {
    let ctx = TestContext::new().await;
    let (barber_id, email) = ctx.barber("Zé").await;
    let joined = ctx
        .service()
        .join(&client("Ana"), join_request(&email))
        .await
        .unwrap();
    let cookie = ctx.barber_cookie(barber_id, &email).await;
    let uri = format!("/api/barber/queue/{}", joined.entry_id);

    let response = ctx
        .app()
        .await
        .oneshot(patch_status(&uri, &cookie, "cancelled"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["entry"]["id"], joined.entry_id.as_i32());
    assert_eq!(body["entry"]["status"], "cancelled");
    assert!(body["entry"]["position"].is_null());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_patch_other_barbers_entry_is_not_found() {
    let ctx = TestContext::new().await;
    let (_, email) = ctx.barber("Zé").await;
    let (rui, rui_email) = ctx.barber("Rui").await;
    let joined = ctx
        .service()
        .join(&client("Ana"), join_request(&email))
        .await
        .unwrap();
    let cookie = ctx.barber_cookie(rui, &rui_email).await;
    let uri = format!("/api/barber/queue/{}", joined.entry_id);

    let response = ctx
        .app()
        .await
        .oneshot(patch_status(&uri, &cookie, "in_service"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
