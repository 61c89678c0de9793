//! Push Hub
//!
//! Fans serialized events out to every connected viewer. Delivery is
//! best-effort per subscriber: a send to a disconnected receiver prunes that
//! subscriber and never blocks or fails the others. Subscribers carry no
//! identity beyond the connection and no state survives a disconnect.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use parking_lot::RwLock;
use tokio::sync::mpsc;

/// Broadcast fan-out over per-subscriber channels
#[derive(Clone)]
pub struct PushHub {
    inner: Arc<PushHubInner>,
}

struct PushHubInner {
    /// Next subscriber handle.
    next_id: AtomicU64,

    /// Connected subscribers. Each entry is the send half of that viewer's
    /// channel; the receive half lives inside its `Subscription`.
    subscribers: RwLock<HashMap<u64, mpsc::UnboundedSender<Arc<String>>>>,
}

impl PushHub {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PushHubInner {
                next_id: AtomicU64::new(0),
                subscribers: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Register a new viewer and hand back its forward-only feed.
    ///
    /// The feed starts empty; replaying current board state is the caller's
    /// job via the queue snapshot.
    pub fn subscribe(&self) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.subscribers.write().insert(id, tx);

        tracing::debug!(subscriber_id = id, "Subscriber connected");

        Subscription {
            id,
            hub: self.clone(),
            receiver: rx,
        }
    }

    /// Remove a subscriber. Idempotent.
    pub fn unsubscribe(&self, id: u64) {
        if self.inner.subscribers.write().remove(&id).is_some() {
            tracing::debug!(subscriber_id = id, "Subscriber removed");
        }
    }

    /// Deliver an already-serialized event to every connected subscriber.
    ///
    /// Snapshot-then-iterate: sends happen outside the lock, so a racing
    /// subscribe/unsubscribe never blocks delivery. Failed sends mark the
    /// receiver as gone and it is pruned; there are no retries.
    pub fn publish(&self, payload: String) {
        let payload = Arc::new(payload);

        let targets: Vec<(u64, mpsc::UnboundedSender<Arc<String>>)> = {
            let subscribers = self.inner.subscribers.read();
            subscribers
                .iter()
                .map(|(id, tx)| (*id, tx.clone()))
                .collect()
        };

        let mut dropped = Vec::new();
        for (id, tx) in targets {
            if tx.send(Arc::clone(&payload)).is_err() {
                dropped.push(id);
            }
        }

        if !dropped.is_empty() {
            let mut subscribers = self.inner.subscribers.write();
            for id in &dropped {
                subscribers.remove(id);
            }
            tracing::debug!(count = dropped.len(), "Pruned disconnected subscribers");
        }
    }

    /// Number of currently connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }
}

impl Default for PushHub {
    fn default() -> Self {
        Self::new()
    }
}

/// One viewer's live feed.
///
/// Dropping the subscription unregisters it immediately, so a closed SSE
/// connection is pruned without waiting for the next failed send.
pub struct Subscription {
    id: u64,
    hub: PushHub,
    receiver: mpsc::UnboundedReceiver<Arc<String>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Stream for Subscription {
    type Item = Arc<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let hub = PushHub::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        hub.publish("hello".to_string());

        assert_eq!(*a.next().await.unwrap(), "hello");
        assert_eq!(*b.next().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_broken_subscriber_is_pruned_without_affecting_others() {
        let hub = PushHub::new();
        let mut alive = hub.subscribe();

        // Register a sender whose receive half is already gone, simulating a
        // torn connection the hub has not noticed yet.
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        drop(dead_rx);
        hub.inner.subscribers.write().insert(999, dead_tx);
        assert_eq!(hub.subscriber_count(), 2);

        hub.publish("still here".to_string());

        assert_eq!(*alive.next().await.unwrap(), "still here");
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let hub = PushHub::new();
        let sub = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);

        drop(sub);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let hub = PushHub::new();
        let sub = hub.subscribe();
        let id = sub.id();

        hub.unsubscribe(id);
        hub.unsubscribe(id);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_with_no_subscribers() {
        let hub = PushHub::new();
        hub.publish("into the void".to_string());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_feed_is_forward_only() {
        let hub = PushHub::new();
        hub.publish("before".to_string());

        let mut sub = hub.subscribe();
        hub.publish("after".to_string());

        assert_eq!(*sub.next().await.unwrap(), "after");
    }
}
