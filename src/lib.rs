//! Relayboard Server Library
//!
//! A self-hosted real-time share board: text snippets and file drops are
//! pushed to every connected viewer over SSE, expire after a retention
//! window, and can be revoked.
//!
//! # Modules
//!
//! - `upload`: upload session lifecycle and the token-keyed session store
//! - `board`: live-event queue and the shared sequence counter
//! - `push`: fan-out of serialized events to connected viewers
//! - `serve`: byte-range resolution and streaming file responses
//! - `thumbs`: best-effort preview generation
//! - `routes`: the HTTP surface binding it all together

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

pub mod board;
pub mod config;
pub mod error;
pub mod push;
pub mod routes;
pub mod serve;
pub mod state;
pub mod thumbs;
pub mod token;
pub mod upload;

use state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check(State(_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the full application router. Shared between the binary and the
/// integration tests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/text", routes::text::router())
        .nest("/api/v1/uploads", routes::upload::router())
        .nest("/api/v1/events", routes::events::router())
        .nest("/files", routes::files::router())
        .with_state(state)
}
