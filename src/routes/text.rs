//! Text posting routes
//!
//! - POST /api/v1/text - post a snippet to the board

use axum::{extract::State, routing::post, Json, Router};

use crate::board::{BoardEvent, EventPayload};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the text router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(post_text))
}

/// POST /api/v1/text
///
/// The raw request body is the snippet. Content at exactly the configured
/// limit is accepted; anything longer is rejected before a sequence number
/// is issued.
async fn post_text(State(state): State<AppState>, body: String) -> Result<Json<BoardEvent>> {
    let limit = state.config().board.text_limit_bytes;
    if body.len() > limit {
        return Err(AppError::ContentTooLarge(format!(
            "text is {} bytes (limit {})",
            body.len(),
            limit
        )));
    }

    let event = BoardEvent {
        seq: state.queue().next_seq(),
        payload: EventPayload::Text { content: body },
    };

    state.announce(event.clone()).await;

    tracing::info!(seq = event.seq, "Text snippet posted");

    Ok(Json(event))
}
