//! Event feed routes
//!
//! - GET /api/v1/events - subscribe to the live push feed (SSE)
//! - GET /api/v1/events/snapshot - current board contents for late joiners
//! - DELETE /api/v1/events/:seq - revoke a live event

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{delete, get};
use axum::{Json, Router};
use futures::{Stream, StreamExt};

use crate::board::BoardEvent;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the events router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(subscribe))
        .route("/snapshot", get(snapshot))
        .route("/:seq", delete(revoke))
}

/// GET /api/v1/events
///
/// Forward-only push feed. New viewers wanting current board state fetch the
/// snapshot first, then attach here; the feed itself replays nothing.
async fn subscribe(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let feed = state.hub().subscribe();

    tracing::debug!(
        subscriber_id = feed.id(),
        subscribers = state.hub().subscriber_count(),
        "Viewer connected"
    );

    let stream = feed.map(|payload| Ok(Event::default().event("board").data(payload.as_str())));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /api/v1/events/snapshot
///
/// Point-in-time copy of the live board, in creation order.
async fn snapshot(State(state): State<AppState>) -> Json<Vec<BoardEvent>> {
    Json(state.queue().snapshot().await)
}

/// DELETE /api/v1/events/:seq
///
/// Take an event off the board and broadcast the removal. Revoking an id
/// that is not live is a 404 — it usually means the client is desynced.
async fn revoke(State(state): State<AppState>, Path(seq): Path<u64>) -> Result<StatusCode> {
    let removed = state
        .revoke(seq)
        .await
        .ok_or_else(|| AppError::NotFound(format!("no live event {}", seq)))?;

    // A revoked file announcement also loses its stored bytes.
    if let Some(token) = removed.file_token() {
        state.sessions().remove(token).await;
    }

    tracing::info!(seq = seq, "Event revoked");

    Ok(StatusCode::NO_CONTENT)
}
