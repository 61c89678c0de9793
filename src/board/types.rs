//! Board event wire types
//!
//! Everything pushed to viewers is a `BoardEvent`: a process-unique sequence
//! number plus a tagged payload. The same JSON shape is used on the SSE feed
//! and in snapshot replies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A broadcastable board item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardEvent {
    /// Monotonically increasing, never reused within a process lifetime.
    pub seq: u64,

    #[serde(flatten)]
    pub payload: EventPayload,
}

/// Kind-specific payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EventPayload {
    /// A posted text snippet.
    Text { content: String },

    /// A finished file drop.
    File(FileAnnouncement),

    /// Removal of a previously broadcast event.
    Revoke { target: u64 },
}

/// Payload of a `File` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnnouncement {
    /// Download token; also the upload session id.
    pub token: String,

    /// Original file name.
    pub name: String,

    /// Final size in bytes.
    pub size: u64,

    /// When the file stops being downloadable.
    pub expires_at: DateTime<Utc>,

    /// Optional inline preview (data URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl BoardEvent {
    /// The upload token, for `File` events.
    pub fn file_token(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::File(file) => Some(&file.token),
            _ => None,
        }
    }
}
