//! Client API (bearer-token authenticated).

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;

use crate::error::Result;
use crate::middleware::RequireIdentity;
use crate::models::{ClientSnapshot, ProfileView};
use crate::services::queue::{JoinRequest, JoinResult, RegisterRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: JoinResult,
}

#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub in_queue: bool,
    #[serde(flatten)]
    pub snapshot: ClientSnapshot,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub created: bool,
    pub person: ProfileView,
}

/// Join a barber's queue.
///
/// Responds `201 Created` for a new entry and `200 OK` when the caller was
/// already waiting.
///
/// # Route
///
/// `POST /api/queue/join`
pub async fn join(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    payload: std::result::Result<Json<JoinRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<JoinResponse>)> {
    let Json(request) = payload?;
    let result = state.queue().join(&identity, request).await?;
    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(JoinResponse {
            success: true,
            result,
        }),
    ))
}

/// The caller's place in line.
///
/// # Route
///
/// `GET /api/queue/me`
pub async fn me(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
) -> Result<Json<SnapshotResponse>> {
    let snapshot = state.queue().client_snapshot(&identity).await?;
    Ok(Json(SnapshotResponse {
        in_queue: snapshot.entry.is_some(),
        snapshot,
        poll_interval_secs: state.poll_interval_secs(),
    }))
}

/// The caller's person record.
///
/// # Route
///
/// `GET /api/profile`
pub async fn profile(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
) -> Result<Json<ProfileView>> {
    let person = state.queue().profile(&identity).await?;
    Ok(Json(person.into()))
}

/// Register the caller as a barber.
///
/// # Route
///
/// `POST /api/barbers/register`
pub async fn register_barber(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>> {
    let Json(request) = payload?;
    let (person, created) = state.queue().register_barber(&identity, request).await?;
    Ok(Json(RegisterResponse {
        success: true,
        created,
        person: person.into(),
    }))
}
