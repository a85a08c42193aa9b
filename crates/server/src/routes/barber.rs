//! Barber panel API (session-authenticated).
//!
//! Every handler re-checks that the session's person is still a barber and
//! only touches entries of that barber's queue.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use barberq_core::{NotifyLinks, QueueStatus};

use super::{Listing, parse_entry_id};
use crate::error::{AppError, Result};
use crate::middleware::RequireBarber;
use crate::models::QueueItem;
use crate::services::queue::NotifyRequest;
use crate::state::AppState;

/// Body of `PATCH /api/barber/queue/{id}`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub entry: QueueItem,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub entries_deleted: u64,
    pub persons_deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    pub success: bool,
    #[serde(flatten)]
    pub links: NotifyLinks,
}

/// The barber's queue, cancelled entries omitted.
///
/// # Route
///
/// `GET /api/barber/queue`
pub async fn list(
    State(state): State<AppState>,
    RequireBarber(barber): RequireBarber,
) -> Result<Json<Listing<QueueItem>>> {
    let service = state.queue();
    let barber_id = service.resolve_barber(&barber).await?;
    let queue = service.barber_queue(barber_id).await?;
    Ok(Json(Listing::new(queue, &state)))
}

/// Delete the whole queue.
///
/// # Route
///
/// `DELETE /api/barber/queue`
pub async fn clear(
    State(state): State<AppState>,
    RequireBarber(barber): RequireBarber,
) -> Result<Json<ClearResponse>> {
    let service = state.queue();
    let barber_id = service.resolve_barber(&barber).await?;
    let cleared = service.clear(barber_id).await?;
    Ok(Json(ClearResponse {
        success: true,
        entries_deleted: cleared.entries,
        persons_deleted: cleared.persons,
    }))
}

/// Change an entry's status.
///
/// # Route
///
/// `PATCH /api/barber/queue/{id}`
pub async fn update_status(
    State(state): State<AppState>,
    RequireBarber(barber): RequireBarber,
    Path(id): Path<String>,
    payload: std::result::Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<EntryResponse>> {
    let entry_id = parse_entry_id(&id)?;
    let Json(update) = payload?;
    let status = update
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::InvalidInput("status is required".to_string()))?
        .parse::<QueueStatus>()
        .map_err(AppError::InvalidInput)?;

    let service = state.queue();
    let barber_id = service.resolve_barber(&barber).await?;
    let entry = service.transition(barber_id, entry_id, status).await?;
    Ok(Json(EntryResponse { entry }))
}

/// Delete one entry.
///
/// # Route
///
/// `DELETE /api/barber/queue/{id}`
pub async fn remove(
    State(state): State<AppState>,
    RequireBarber(barber): RequireBarber,
    Path(id): Path<String>,
) -> Result<Json<RemoveResponse>> {
    let entry_id = parse_entry_id(&id)?;
    let service = state.queue();
    let barber_id = service.resolve_barber(&barber).await?;
    service.remove(barber_id, entry_id).await?;
    Ok(Json(RemoveResponse { success: true }))
}

/// WhatsApp links for calling a client.
///
/// # Route
///
/// `POST /api/barber/queue/{id}/notify`
pub async fn notify(
    State(state): State<AppState>,
    RequireBarber(barber): RequireBarber,
    Path(id): Path<String>,
    payload: std::result::Result<Json<NotifyRequest>, JsonRejection>,
) -> Result<Json<NotifyResponse>> {
    let entry_id = parse_entry_id(&id)?;
    let Json(request) = payload?;
    let service = state.queue();
    let barber_id = service.resolve_barber(&barber).await?;
    let links = service.notify(barber_id, entry_id, request).await?;
    Ok(Json(NotifyResponse {
        success: true,
        links,
    }))
}
