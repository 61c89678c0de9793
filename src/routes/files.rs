//! File serving routes
//!
//! Serves finished uploads from local storage, with byte-range support for
//! audio and video.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use crate::error::{AppError, Result};
use crate::serve;
use crate::state::AppState;
use crate::token;

/// Create the files router
pub fn router() -> Router<AppState> {
    Router::new().route("/:token", get(serve_file))
}

/// GET /files/:token
async fn serve_file(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    if !token::is_valid(&token) {
        return Err(AppError::NotFound(token));
    }

    // Lazy expiry: the lookup itself destroys a session past its window, so
    // the first read after expiry already sees not-found.
    let session = state
        .sessions()
        .get_live(&token)
        .await
        .ok_or_else(|| AppError::NotFound(token))?;

    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());

    serve::file_response(&session, range).await
}
