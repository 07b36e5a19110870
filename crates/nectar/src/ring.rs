//! Bounded ring of recent outcomes
//!
//! The default response callback appends here so applications that never
//! wire their own callback can still inspect what happened to their
//! events. The ring is bounded: once full, new outcomes are counted and
//! dropped rather than evicting older ones the application may not have
//! read yet.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

use nectar_transmission::{Response, ResponseCallback};

/// Bounded buffer of recent per-event outcomes
#[derive(Debug)]
pub struct ResponseRing {
    inner: Mutex<VecDeque<Response>>,
    capacity: usize,
    dropped: AtomicU64,
    notify: Notify,
}

impl ResponseRing {
    /// Create a ring holding at most `capacity` outcomes
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            dropped: AtomicU64::new(0),
            notify: Notify::new(),
        }
    }

    /// Append a group of outcomes, dropping whatever exceeds capacity
    pub fn push_all(&self, responses: Vec<Response>) {
        let mut pushed = false;
        {
            let mut inner = self.inner.lock();
            for response in responses {
                if inner.len() < self.capacity {
                    inner.push_back(response);
                    pushed = true;
                } else {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        if pushed {
            self.notify.notify_one();
        }
    }

    /// Take every buffered outcome, oldest first
    pub fn drain(&self) -> Vec<Response> {
        self.inner.lock().drain(..).collect()
    }

    /// Number of buffered outcomes
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the ring is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Outcomes dropped because the ring was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Wait until the next group of outcomes is appended.
    ///
    /// Wakes at most one waiter per append; drain after waking.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    /// A response callback feeding this ring
    pub fn callback(self: &Arc<Self>) -> ResponseCallback {
        let ring = Arc::clone(self);
        Arc::new(move |responses| ring.push_all(responses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn response(marker: i64) -> Response {
        Response {
            metadata: json!(marker),
            status_code: Some(202),
            duration: std::time::Duration::ZERO,
            error: None,
        }
    }

    #[test]
    fn test_push_and_drain_preserve_order() {
        let ring = ResponseRing::new(10);
        ring.push_all(vec![response(1), response(2)]);
        ring.push_all(vec![response(3)]);

        let markers: Vec<Value> = ring.drain().into_iter().map(|r| r.metadata).collect();
        assert_eq!(markers, vec![json!(1), json!(2), json!(3)]);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_full_ring_drops_new_outcomes() {
        let ring = ResponseRing::new(2);
        ring.push_all(vec![response(1), response(2), response(3), response(4)]);

        assert_eq!(ring.len(), 2);
        assert_eq!(ring.dropped(), 2);

        // The oldest outcomes survive
        let markers: Vec<Value> = ring.drain().into_iter().map(|r| r.metadata).collect();
        assert_eq!(markers, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_drain_frees_capacity() {
        let ring = ResponseRing::new(2);
        ring.push_all(vec![response(1), response(2)]);
        ring.drain();
        ring.push_all(vec![response(3)]);

        assert_eq!(ring.len(), 1);
        assert_eq!(ring.dropped(), 0);
    }

    #[tokio::test]
    async fn test_notified_wakes_on_append() {
        let ring = Arc::new(ResponseRing::new(10));

        let waiter = {
            let ring = Arc::clone(&ring);
            tokio::spawn(async move {
                ring.notified().await;
                ring.drain().len()
            })
        };

        // Give the waiter a chance to park before appending
        tokio::task::yield_now().await;
        ring.push_all(vec![response(1)]);

        assert_eq!(waiter.await.unwrap(), 1);
    }

    #[test]
    fn test_callback_feeds_ring() {
        let ring = Arc::new(ResponseRing::new(10));
        let callback = ring.callback();
        callback(vec![response(1), response(2)]);

        assert_eq!(ring.len(), 2);
    }
}
