//! Upload session types

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// Constants
// ============================================================================

/// How long a finished upload stays downloadable: 1 hour.
pub const DEFAULT_RETENTION_SECS: i64 = 60 * 60;

/// A session still receiving chunks after this long is considered abandoned.
pub const DEFAULT_RECEIVING_TIMEOUT_SECS: i64 = 60 * 60;

// ============================================================================
// Session Types
// ============================================================================

/// An in-flight or completed file upload.
///
/// `id`, `file_name` and `storage_path` are fixed at creation. `size_bytes`
/// only grows through sequential appends and freezes on finish.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSession {
    /// Unique hex token, also the storage key.
    pub id: String,

    /// Original file name as announced by the client.
    pub file_name: String,

    /// Location of the backing byte store on disk.
    #[serde(skip)]
    pub storage_path: PathBuf,

    /// Bytes written so far; frozen once finished.
    pub size_bytes: u64,

    /// Current lifecycle state.
    pub state: SessionState,

    /// Session creation time.
    pub created_at: DateTime<Utc>,

    /// Absolute expiry, set only when the upload finishes.
    pub expires_at: Option<DateTime<Utc>>,
}

impl UploadSession {
    pub fn new(id: String, file_name: String, storage_path: PathBuf) -> Self {
        Self {
            id,
            file_name,
            storage_path,
            size_bytes: 0,
            state: SessionState::Receiving,
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Whether the retention window has passed.
    ///
    /// Expiry is a predicate evaluated on lookup, not a stored transition.
    /// A session without an `expires_at` (still receiving) never expires by
    /// time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Utc::now() > at,
            None => false,
        }
    }

    pub fn is_receiving(&self) -> bool {
        self.state == SessionState::Receiving
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }
}

/// Session lifecycle state.
///
/// Removal is absence from the registry and expiry is time-based, so the
/// stored machine only ever moves `Receiving` -> `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Accepting sequential chunk appends.
    Receiving,
    /// Byte count frozen, downloadable until expiry.
    Finished,
}

// ============================================================================
// Error Types
// ============================================================================

/// Upload error types
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Unknown upload session: {0}")]
    UnknownSession(String),

    #[error("Failed to allocate backing storage: {0}")]
    Allocation(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::UnknownSession(_) => StatusCode::NOT_FOUND,
            Self::Allocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
