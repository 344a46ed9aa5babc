//! Subscriber Handles
//!
//! A [`Subscriber`] owns a private FIFO inbox and the wait condition used
//! to park a consumer while that inbox is empty. The channel registry only
//! keeps a weak reference to the inbox, so dropping the handle is enough to
//! stop deliveries to it.
//!
//! ## Waiting
//!
//! ```text
//!  pop_message()
//!       │
//!       ▼
//!  arm Notified ──> inbox non-empty? ──yes──> return oldest
//!       ▲                  │
//!       │                  no
//!       │                  ▼
//!       └──────────── await Notified   (woken by every delivery)
//! ```
//!
//! The waiter is armed before the inbox is checked, so a delivery racing
//! with the check is never missed. Dropping a pending `pop_message` future
//! releases the waiter without touching the inbox.

use crate::config::DEFAULT_INBOX_CAPACITY;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::trace;

/// Source of process-unique subscriber ids
static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a subscriber handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    fn next() -> Self {
        SubscriberId(NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Message queue plus wait condition shared with the registry.
#[derive(Debug)]
pub(crate) struct Inbox {
    messages: Mutex<VecDeque<Bytes>>,
    notify: Notify,
}

impl Inbox {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
        }
    }

    /// Appends a message and wakes one waiting consumer.
    pub(crate) fn push(&self, message: Bytes) {
        self.messages.lock().push_back(message);
        self.notify.notify_one();
    }

    fn pop(&self) -> Option<Bytes> {
        self.messages.lock().pop_front()
    }

    fn len(&self) -> usize {
        self.messages.lock().len()
    }
}

/// A pub/sub consumer: an identity, an inbox, and a way to wait on it.
///
/// # Example
///
/// ```
/// use mockkv::{MockStore, Subscriber};
/// use bytes::Bytes;
///
/// # tokio_test::block_on(async {
/// let store = MockStore::new();
/// let subscriber = Subscriber::new();
///
/// store.subscribe(&subscriber, ["news"]);
/// store.execute("PUBLISH", ["news", "hello"]).unwrap();
///
/// assert_eq!(subscriber.pop_message().await, Bytes::from("hello"));
/// # });
/// ```
#[derive(Debug)]
pub struct Subscriber {
    id: SubscriberId,
    inbox: Arc<Inbox>,
}

impl Default for Subscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl Subscriber {
    /// Creates a subscriber with the default inbox capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INBOX_CAPACITY)
    }

    /// Creates a subscriber whose inbox starts with room for `capacity`
    /// messages.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id: SubscriberId::next(),
            inbox: Arc::new(Inbox::with_capacity(capacity)),
        }
    }

    /// Returns this subscriber's id.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Returns the number of messages waiting in the inbox.
    pub fn pending(&self) -> usize {
        self.inbox.len()
    }

    /// Removes and returns the oldest message without waiting.
    pub fn try_pop(&self) -> Option<Bytes> {
        self.inbox.pop()
    }

    /// Removes and returns the oldest message, waiting for a delivery if
    /// the inbox is empty.
    ///
    /// There is no built-in timeout; see
    /// [`pop_message_timeout`](Self::pop_message_timeout) for a bounded
    /// wait. Messages that arrive while waiting stay queued for the next
    /// call.
    pub async fn pop_message(&self) -> Bytes {
        loop {
            let notified = self.inbox.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(message) = self.inbox.pop() {
                trace!(subscriber = %self.id, "Popped message");
                return message;
            }

            notified.await;
        }
    }

    /// Like [`pop_message`](Self::pop_message), but gives up after
    /// `timeout`.
    ///
    /// Returns `None` on timeout; the inbox is left as it was.
    pub async fn pop_message_timeout(&self, timeout: Duration) -> Option<Bytes> {
        tokio::time::timeout(timeout, self.pop_message()).await.ok()
    }

    pub(crate) fn downgrade(&self) -> Weak<Inbox> {
        Arc::downgrade(&self.inbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::task;
    use tokio_test::{assert_pending, assert_ready_eq};

    #[test]
    fn test_ids_are_unique() {
        let a = Subscriber::new();
        let b = Subscriber::new();
        assert_ne!(a.id(), b.id());
        assert!(a.id().as_u64() < b.id().as_u64());
        assert_eq!(a.id().to_string(), format!("sub-{}", a.id().as_u64()));
    }

    #[test]
    fn test_pop_ready_message_without_waiting() {
        let subscriber = Subscriber::new();
        subscriber.inbox.push(Bytes::from("m1"));

        let mut pop = task::spawn(subscriber.pop_message());
        assert_ready_eq!(pop.poll(), Bytes::from("m1"));
    }

    #[test]
    fn test_pop_waits_for_delivery() {
        let subscriber = Subscriber::new();

        let mut pop = task::spawn(subscriber.pop_message());
        assert_pending!(pop.poll());

        subscriber.inbox.push(Bytes::from("m"));
        assert!(pop.is_woken());
        assert_ready_eq!(pop.poll(), Bytes::from("m"));
    }

    #[test]
    fn test_pop_returns_only_oldest_of_queued() {
        let subscriber = Subscriber::new();

        let mut pop = task::spawn(subscriber.pop_message());
        assert_pending!(pop.poll());

        subscriber.inbox.push(Bytes::from("m1"));
        subscriber.inbox.push(Bytes::from("m2"));
        assert_ready_eq!(pop.poll(), Bytes::from("m1"));
        drop(pop);

        assert_eq!(subscriber.pending(), 1);
        assert_eq!(subscriber.try_pop(), Some(Bytes::from("m2")));
    }

    #[test]
    fn test_cancelled_pop_leaves_inbox_intact() {
        let subscriber = Subscriber::new();

        let mut pop = task::spawn(subscriber.pop_message());
        assert_pending!(pop.poll());
        drop(pop);

        subscriber.inbox.push(Bytes::from("kept"));
        assert_eq!(subscriber.pending(), 1);

        let mut pop = task::spawn(subscriber.pop_message());
        assert_ready_eq!(pop.poll(), Bytes::from("kept"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pop_timeout() {
        let subscriber = Subscriber::new();

        let popped = subscriber.pop_message_timeout(Duration::from_secs(1)).await;
        assert_eq!(popped, None);

        subscriber.inbox.push(Bytes::from("late"));
        let popped = subscriber.pop_message_timeout(Duration::from_secs(1)).await;
        assert_eq!(popped, Some(Bytes::from("late")));
    }

    #[test]
    fn test_weak_reference_dies_with_handle() {
        let subscriber = Subscriber::new();
        let weak = subscriber.downgrade();
        assert!(weak.upgrade().is_some());

        drop(subscriber);
        assert!(weak.upgrade().is_none());
    }
}
