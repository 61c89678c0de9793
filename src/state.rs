//! Application state management

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::board::{BoardEvent, EventPayload, MessageQueue};
use crate::config::Config;
use crate::push::PushHub;
use crate::thumbs::{ImageThumbnailer, ThumbnailProvider};
use crate::upload::{SessionStore, UploadError};

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize upload store: {0}")]
    StoreInit(#[from] UploadError),
}

/// Shared application state
///
/// Owns every registry with process lifetime: the upload session store, the
/// live-event queue and the subscriber hub. Instantiated once at startup and
/// handed to the router; nothing here is a global.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    sessions: SessionStore,
    queue: MessageQueue,
    hub: PushHub,
    thumbnailer: Arc<dyn ThumbnailProvider>,

    /// Serializes queue mutation + fan-out so subscribers observe events in
    /// queue order and never see a revoke before its enqueue.
    publish_order: Mutex<()>,
}

impl AppState {
    /// Create a new application state
    pub async fn new(config: Config) -> Result<Self, StateError> {
        let sessions = SessionStore::new(
            config.storage.data_dir.clone(),
            config.board.retention_secs,
            config.board.receiving_timeout_secs,
        )
        .await?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                sessions,
                queue: MessageQueue::new(),
                hub: PushHub::new(),
                thumbnailer: Arc::new(ImageThumbnailer),
                publish_order: Mutex::new(()),
            }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the upload session store
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Get the live-event queue
    pub fn queue(&self) -> &MessageQueue {
        &self.inner.queue
    }

    /// Get the push hub
    pub fn hub(&self) -> &PushHub {
        &self.inner.hub
    }

    /// Get the thumbnail provider
    pub fn thumbnailer(&self) -> &dyn ThumbnailProvider {
        self.inner.thumbnailer.as_ref()
    }

    /// Enqueue a live event and fan it out to every connected viewer.
    pub async fn announce(&self, event: BoardEvent) {
        let _order = self.inner.publish_order.lock().await;
        self.inner.queue.enqueue(event.clone()).await;
        self.broadcast(&event);
    }

    /// Revoke a live event, broadcasting the removal.
    ///
    /// Returns the removed event so callers can cascade (a revoked file
    /// announcement also drops the stored bytes). `None` if the id is not
    /// live; nothing is broadcast in that case.
    pub async fn revoke(&self, target: u64) -> Option<BoardEvent> {
        let _order = self.inner.publish_order.lock().await;
        let removed = self.inner.queue.revoke(target).await?;

        let event = BoardEvent {
            seq: self.inner.queue.next_seq(),
            payload: EventPayload::Revoke { target },
        };
        self.broadcast(&event);

        Some(removed)
    }

    fn broadcast(&self, event: &BoardEvent) {
        match serde_json::to_string(event) {
            Ok(json) => self.inner.hub.publish(json),
            Err(e) => tracing::error!(seq = event.seq, error = %e, "Failed to serialize event"),
        }
    }
}
