//! Upload Session Store
//!
//! In-memory registry mapping session tokens to upload sessions. The backing
//! bytes live on the local filesystem, one file per session keyed by token.
//! Expiry is checked lazily on lookup; a periodic cleanup task bounds the
//! storage used by expired and abandoned sessions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::types::{SessionState, UploadError, UploadSession};
use crate::token;

// ============================================================================
// Session Store
// ============================================================================

/// Registry of upload sessions
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    /// Registered sessions indexed by token.
    sessions: RwLock<HashMap<String, UploadSession>>,

    /// Directory holding one backing file per session.
    base_dir: PathBuf,

    /// Retention window applied when an upload finishes.
    retention: Duration,

    /// Age after which a session stuck in `Receiving` is reaped.
    receiving_timeout: Duration,
}

impl SessionStore {
    /// Create a store rooted at `base_dir`, creating the directory if needed.
    pub async fn new(
        base_dir: impl Into<PathBuf>,
        retention_secs: i64,
        receiving_timeout_secs: i64,
    ) -> Result<Self, UploadError> {
        let base_dir = base_dir.into();

        tokio::fs::create_dir_all(&base_dir).await.map_err(|e| {
            UploadError::Allocation(format!(
                "failed to create storage directory {}: {}",
                base_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
                base_dir,
                retention: Duration::seconds(retention_secs),
                receiving_timeout: Duration::seconds(receiving_timeout_secs),
            }),
        })
    }

    // ========================================================================
    // Session Lifecycle
    // ========================================================================

    /// Register a new session and allocate its empty backing file.
    pub async fn create(&self, file_name: &str) -> Result<UploadSession, UploadError> {
        // Reserve the token under the lock, then allocate the file without
        // holding it. Tokens carry 128 bits of entropy; the collision loop is
        // there to keep the one-session-per-token invariant airtight.
        let session = {
            let mut sessions = self.inner.sessions.write().await;
            let mut id = token::generate();
            while sessions.contains_key(&id) {
                id = token::generate();
            }
            let session = UploadSession::new(
                id.clone(),
                file_name.to_string(),
                self.inner.base_dir.join(&id),
            );
            sessions.insert(id, session.clone());
            session
        };

        if let Err(e) = tokio::fs::File::create(&session.storage_path).await {
            self.inner.sessions.write().await.remove(&session.id);
            return Err(UploadError::Allocation(format!(
                "failed to create {}: {}",
                session.storage_path.display(),
                e
            )));
        }

        tracing::info!(
            session_id = %session.id,
            file_name = %session.file_name,
            "Created upload session"
        );

        Ok(session)
    }

    /// Get a session by token.
    pub async fn get(&self, id: &str) -> Option<UploadSession> {
        self.inner.sessions.read().await.get(id).cloned()
    }

    /// Append a chunk to a receiving session.
    ///
    /// Chunks for one session arrive sequentially from a single connection;
    /// the store preserves call order and never reorders. Returns the new
    /// total size. A failed call leaves `size_bytes` untouched.
    pub async fn append_chunk(&self, id: &str, data: &[u8]) -> Result<u64, UploadError> {
        // Resolve the path up front; the registry lock is never held across
        // file I/O.
        let path = {
            let sessions = self.inner.sessions.read().await;
            let session = sessions
                .get(id)
                .filter(|s| s.is_receiving())
                .ok_or_else(|| UploadError::UnknownSession(id.to_string()))?;
            session.storage_path.clone()
        };

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .await?;
        file.write_all(data).await?;
        file.flush().await?;

        let mut sessions = self.inner.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .filter(|s| s.is_receiving())
            .ok_or_else(|| UploadError::UnknownSession(id.to_string()))?;
        session.size_bytes += data.len() as u64;

        tracing::debug!(
            session_id = %id,
            chunk_bytes = data.len(),
            total_bytes = session.size_bytes,
            "Chunk appended"
        );

        Ok(session.size_bytes)
    }

    /// Transition a receiving session to finished, freezing its size and
    /// starting the retention window.
    pub async fn finish(&self, id: &str) -> Result<UploadSession, UploadError> {
        let mut sessions = self.inner.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .filter(|s| s.is_receiving())
            .ok_or_else(|| UploadError::UnknownSession(id.to_string()))?;

        session.state = SessionState::Finished;
        session.expires_at = Some(Utc::now() + self.inner.retention);

        tracing::info!(
            session_id = %id,
            file_name = %session.file_name,
            size_bytes = session.size_bytes,
            "Upload finished"
        );

        Ok(session.clone())
    }

    /// Remove a session and delete its backing bytes.
    ///
    /// Idempotent: removing an unknown token is a no-op, which keeps cleanup
    /// races with lazy expiry harmless.
    pub async fn remove(&self, id: &str) {
        let removed = { self.inner.sessions.write().await.remove(id) };

        if let Some(session) = removed {
            if let Err(e) = tokio::fs::remove_file(&session.storage_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(session_id = %id, error = %e, "Failed to delete backing file");
                }
            }
            tracing::info!(
                session_id = %id,
                file_name = %session.file_name,
                "Upload session removed"
            );
        }
    }

    // ========================================================================
    // Read-side Queries
    // ========================================================================

    /// Get a finished, unexpired session whose bytes are still on disk.
    ///
    /// The first lookup past the expiry destroys the session and its backing
    /// file, so readers after the window consistently see not-found.
    pub async fn get_live(&self, id: &str) -> Option<UploadSession> {
        let session = self.get(id).await?;

        if !session.is_finished() {
            return None;
        }

        let bytes_present = tokio::fs::try_exists(&session.storage_path)
            .await
            .unwrap_or(false);

        if session.is_expired() || !bytes_present {
            self.remove(id).await;
            return None;
        }

        Some(session)
    }

    /// Whether a token refers to a finished, unexpired, still-stored file.
    pub async fn is_live_and_unexpired(&self, id: &str) -> bool {
        self.get_live(id).await.is_some()
    }

    /// Number of registered sessions, any state.
    pub async fn session_count(&self) -> usize {
        self.inner.sessions.read().await.len()
    }

    // ========================================================================
    // Cleanup
    // ========================================================================

    /// Purge expired sessions and abandoned receiving sessions.
    ///
    /// Returns the number of sessions purged.
    pub async fn purge_stale(&self) -> usize {
        let receiving_cutoff = Utc::now() - self.inner.receiving_timeout;

        let stale: Vec<String> = {
            let sessions = self.inner.sessions.read().await;
            sessions
                .values()
                .filter(|s| {
                    s.is_expired() || (s.is_receiving() && s.created_at < receiving_cutoff)
                })
                .map(|s| s.id.clone())
                .collect()
        };

        let count = stale.len();
        for id in stale {
            tracing::debug!(session_id = %id, "Purging stale upload session");
            self.remove(&id).await;
        }

        if count > 0 {
            tracing::info!(count = count, "Purged stale upload sessions");
        }

        count
    }

    /// Start the background cleanup task.
    pub fn start_cleanup_task(self, interval_secs: u64) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs));

            loop {
                interval.tick().await;
                self.purge_stale().await;
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::types::{DEFAULT_RECEIVING_TIMEOUT_SECS, DEFAULT_RETENTION_SECS};
    use tempfile::tempdir;

    async fn test_store(dir: &std::path::Path) -> SessionStore {
        SessionStore::new(dir, DEFAULT_RETENTION_SECS, DEFAULT_RECEIVING_TIMEOUT_SECS)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_append_finish() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path()).await;

        let session = store.create("notes.txt").await.unwrap();
        assert_eq!(session.state, SessionState::Receiving);
        assert_eq!(session.size_bytes, 0);
        assert!(session.expires_at.is_none());

        assert_eq!(store.append_chunk(&session.id, b"hello ").await.unwrap(), 6);
        assert_eq!(store.append_chunk(&session.id, b"world").await.unwrap(), 11);

        let finished = store.finish(&session.id).await.unwrap();
        assert_eq!(finished.state, SessionState::Finished);
        assert_eq!(finished.size_bytes, 11);
        assert!(finished.expires_at.is_some());

        // Byte order of sequential appends is preserved on disk.
        let bytes = tokio::fs::read(&finished.storage_path).await.unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[tokio::test]
    async fn test_append_after_finish_is_rejected_and_size_frozen() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path()).await;

        let session = store.create("frozen.bin").await.unwrap();
        store.append_chunk(&session.id, b"data").await.unwrap();
        store.finish(&session.id).await.unwrap();

        let err = store.append_chunk(&session.id, b"more").await.unwrap_err();
        assert!(matches!(err, UploadError::UnknownSession(_)));

        let after = store.get(&session.id).await.unwrap();
        assert_eq!(after.size_bytes, 4);
        let bytes = tokio::fs::read(&after.storage_path).await.unwrap();
        assert_eq!(bytes, b"data");
    }

    #[tokio::test]
    async fn test_append_unknown_session() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path()).await;

        let err = store.append_chunk("deadbeef", b"x").await.unwrap_err();
        assert!(matches!(err, UploadError::UnknownSession(_)));
    }

    #[tokio::test]
    async fn test_finish_twice_fails() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path()).await;

        let session = store.create("once.txt").await.unwrap();
        store.finish(&session.id).await.unwrap();

        let err = store.finish(&session.id).await.unwrap_err();
        assert!(matches!(err, UploadError::UnknownSession(_)));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path()).await;

        let session = store.create("gone.txt").await.unwrap();
        let path = session.storage_path.clone();

        store.remove(&session.id).await;
        assert!(store.get(&session.id).await.is_none());
        assert!(!path.exists());

        // Second removal of the same token is a no-op.
        store.remove(&session.id).await;
        store.remove("0000000000000000").await;
    }

    #[tokio::test]
    async fn test_expired_session_destroyed_on_access() {
        let dir = tempdir().unwrap();
        // Negative retention: finished sessions are already past expiry.
        let store = SessionStore::new(dir.path(), -1, DEFAULT_RECEIVING_TIMEOUT_SECS)
            .await
            .unwrap();

        let session = store.create("brief.txt").await.unwrap();
        store.append_chunk(&session.id, b"fleeting").await.unwrap();
        store.finish(&session.id).await.unwrap();

        assert!(!store.is_live_and_unexpired(&session.id).await);

        // The expiry check destroyed the session and its bytes.
        assert!(store.get(&session.id).await.is_none());
        assert!(!session.storage_path.exists());
    }

    #[tokio::test]
    async fn test_receiving_session_is_not_live() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path()).await;

        let session = store.create("partial.txt").await.unwrap();
        store.append_chunk(&session.id, b"half").await.unwrap();

        assert!(!store.is_live_and_unexpired(&session.id).await);
        // Not destroyed: still receiving.
        assert!(store.get(&session.id).await.is_some());
    }

    #[tokio::test]
    async fn test_purge_reaps_expired_and_abandoned() {
        let dir = tempdir().unwrap();
        // Both windows in the past so everything is immediately stale.
        let store = SessionStore::new(dir.path(), -1, -1).await.unwrap();

        let finished = store.create("done.txt").await.unwrap();
        store.finish(&finished.id).await.unwrap();
        let abandoned = store.create("stuck.txt").await.unwrap();

        assert_eq!(store.purge_stale().await, 2);
        assert!(store.get(&finished.id).await.is_none());
        assert!(store.get(&abandoned.id).await.is_none());
        assert_eq!(store.session_count().await, 0);
    }
}
