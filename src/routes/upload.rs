//! Upload Routes
//!
//! HTTP endpoints for the file drop lifecycle.
//!
//! Endpoints:
//! - POST /api/v1/uploads - announce a file, open a session
//! - POST /api/v1/uploads/:token/chunks - append a chunk (raw request body)
//! - POST /api/v1/uploads/:token/finish - freeze the file and announce it
//! - GET /api/v1/uploads/:token - session status
//! - DELETE /api/v1/uploads/:token - remove the file and its bytes

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::board::{BoardEvent, EventPayload, FileAnnouncement};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::upload::UploadSession;

/// Create the upload router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_upload))
        .route("/:token/chunks", post(append_chunk))
        .route("/:token/finish", post(finish_upload))
        .route("/:token", get(get_upload))
        .route("/:token", delete(remove_upload))
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUploadRequest {
    file_name: String,
}

/// POST /api/v1/uploads
///
/// Open an upload session. The returned token is both the chunk target and
/// the eventual download key.
async fn create_upload(
    State(state): State<AppState>,
    Json(request): Json<CreateUploadRequest>,
) -> Result<Json<UploadSession>> {
    if request.file_name.is_empty() {
        return Err(AppError::BadRequest("fileName must not be empty".to_string()));
    }

    let session = state.sessions().create(&request.file_name).await?;
    Ok(Json(session))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppendChunkResponse {
    appended: usize,
    size_bytes: u64,
}

/// POST /api/v1/uploads/:token/chunks
///
/// Append one chunk; the chunk data is the raw request body. Chunks for a
/// session are sent sequentially over one connection.
async fn append_chunk(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<Json<AppendChunkResponse>> {
    let size_bytes = state.sessions().append_chunk(&token, &body).await?;

    Ok(Json(AppendChunkResponse {
        appended: body.len(),
        size_bytes,
    }))
}

/// POST /api/v1/uploads/:token/finish
///
/// Freeze the upload and announce it to the board. Thumbnail generation is
/// best-effort and never blocks the announcement.
async fn finish_upload(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<BoardEvent>> {
    let session = state.sessions().finish(&token).await?;

    let expires_at = session
        .expires_at
        .ok_or_else(|| AppError::Internal("finished session missing expiry".to_string()))?;

    let thumbnail = state
        .thumbnailer()
        .generate(&session.storage_path, &session.file_name)
        .await;

    let event = BoardEvent {
        seq: state.queue().next_seq(),
        payload: EventPayload::File(FileAnnouncement {
            token: session.id.clone(),
            name: session.file_name.clone(),
            size: session.size_bytes,
            expires_at,
            thumbnail,
        }),
    };

    state.announce(event.clone()).await;

    tracing::info!(
        seq = event.seq,
        session_id = %session.id,
        file_name = %session.file_name,
        size_bytes = session.size_bytes,
        "File announced"
    );

    Ok(Json(event))
}

/// GET /api/v1/uploads/:token
///
/// Get upload session status.
async fn get_upload(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<UploadSession>> {
    let session = state
        .sessions()
        .get(&token)
        .await
        .ok_or_else(|| AppError::NotFound(token))?;

    Ok(Json(session))
}

/// DELETE /api/v1/uploads/:token
///
/// Remove the session and its bytes. Idempotent: deleting an unknown token
/// succeeds, so cleanup racing expiry stays quiet.
async fn remove_upload(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<StatusCode> {
    state.sessions().remove(&token).await;
    Ok(StatusCode::NO_CONTENT)
}
