//! Message Queue
//!
//! Ordered sequence of live board events. Sequence numbers come from a single
//! shared counter so text posts and file finishes racing from independent
//! connections can never collide; revocation removes an event but never
//! reuses or rewinds the counter.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::types::BoardEvent;

/// Ordered live-event queue with a shared sequence counter
#[derive(Clone)]
pub struct MessageQueue {
    inner: Arc<MessageQueueInner>,
}

struct MessageQueueInner {
    /// Next unissued sequence number.
    next_seq: AtomicU64,

    /// Live events in creation order. Revoke broadcasts are not board state
    /// and never land here.
    live: RwLock<VecDeque<BoardEvent>>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MessageQueueInner {
                next_seq: AtomicU64::new(0),
                live: RwLock::new(VecDeque::new()),
            }),
        }
    }

    /// Atomically issue the next sequence number.
    pub fn next_seq(&self) -> u64 {
        self.inner.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Append a live event at the tail.
    pub async fn enqueue(&self, event: BoardEvent) {
        let mut live = self.inner.live.write().await;
        tracing::debug!(seq = event.seq, "Event enqueued");
        live.push_back(event);
    }

    /// Remove and return the live event with the given sequence number.
    ///
    /// `None` means the id is not on the board (already revoked, expired off,
    /// or never existed) — callers report that rather than ignoring it, since
    /// it usually signals a desynchronized client.
    pub async fn revoke(&self, seq: u64) -> Option<BoardEvent> {
        let mut live = self.inner.live.write().await;
        let pos = live.iter().position(|e| e.seq == seq)?;
        let event = live.remove(pos);
        tracing::debug!(seq = seq, "Event revoked");
        event
    }

    /// Point-in-time copy of the live queue, in creation order.
    pub async fn snapshot(&self) -> Vec<BoardEvent> {
        self.inner.live.read().await.iter().cloned().collect()
    }

    /// Number of live events.
    pub async fn live_count(&self) -> usize {
        self.inner.live.read().await.len()
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::types::EventPayload;

    fn text_event(seq: u64) -> BoardEvent {
        BoardEvent {
            seq,
            payload: EventPayload::Text {
                content: format!("snippet {}", seq),
            },
        }
    }

    #[tokio::test]
    async fn test_sequence_starts_at_zero_and_increases() {
        let queue = MessageQueue::new();
        assert_eq!(queue.next_seq(), 0);
        assert_eq!(queue.next_seq(), 1);
        assert_eq!(queue.next_seq(), 2);
    }

    #[tokio::test]
    async fn test_sequence_never_reused_after_revoke() {
        let queue = MessageQueue::new();

        let a = queue.next_seq();
        queue.enqueue(text_event(a)).await;
        let b = queue.next_seq();
        queue.enqueue(text_event(b)).await;

        assert!(queue.revoke(a).await.is_some());

        // The counter keeps moving forward past the revoked id.
        let c = queue.next_seq();
        assert!(c > b);
    }

    #[tokio::test]
    async fn test_revoke_absent_leaves_queue_unchanged() {
        let queue = MessageQueue::new();
        let seq = queue.next_seq();
        queue.enqueue(text_event(seq)).await;

        assert!(queue.revoke(999).await.is_none());

        let snapshot = queue.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].seq, seq);
    }

    #[tokio::test]
    async fn test_revoke_same_id_twice() {
        let queue = MessageQueue::new();
        let seq = queue.next_seq();
        queue.enqueue(text_event(seq)).await;

        assert!(queue.revoke(seq).await.is_some());
        assert!(queue.revoke(seq).await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_preserves_creation_order() {
        let queue = MessageQueue::new();
        for _ in 0..5 {
            let seq = queue.next_seq();
            queue.enqueue(text_event(seq)).await;
        }
        queue.revoke(2).await;

        let seqs: Vec<u64> = queue.snapshot().await.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 3, 4]);
    }

    #[tokio::test]
    async fn test_concurrent_sequence_issue_is_unique() {
        let queue = MessageQueue::new();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let queue = queue.clone();
            handles.push(tokio::spawn(async move {
                (0..100).map(|_| queue.next_seq()).collect::<Vec<u64>>()
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 800);
    }
}
