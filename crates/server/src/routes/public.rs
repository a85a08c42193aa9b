//! Public queue page API. No authentication, no contact details.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use super::Listing;
use crate::error::Result;
use crate::models::PublicQueueItem;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PublicQueueQuery {
    /// Barber email.
    pub barber: Option<String>,
}

/// A barber's queue for the waiting-room screen.
///
/// # Route
///
/// `GET /api/public/queue?barber=EMAIL`
pub async fn queue(
    State(state): State<AppState>,
    Query(query): Query<PublicQueueQuery>,
) -> Result<Json<Listing<PublicQueueItem>>> {
    let queue = state.queue().public_queue(query.barber.as_deref()).await?;
    Ok(Json(Listing::new(queue, &state)))
}
