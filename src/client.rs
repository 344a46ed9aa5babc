//! Test-facing clients.
//!
//! These mirror the two client objects test code usually holds against a
//! real store: a command client and a pub/sub client. Both are thin views
//! over a shared [`MockStore`]; any number of them can point at the same
//! store.
//!
//! ```
//! use mockkv::{MockClient, MockPubSubClient, MockStore, Reply};
//! use bytes::Bytes;
//!
//! # tokio_test::block_on(async {
//! let store = MockStore::new();
//! let publisher = MockClient::new(store.clone());
//! let listener = MockPubSubClient::new(store.clone());
//!
//! listener.subscribe(["events"]);
//! assert_eq!(publisher.call("PUBLISH", ["events", "ping"]).unwrap(), Reply::integer(1));
//! assert_eq!(listener.pop_message().await, Bytes::from("ping"));
//!
//! publisher.clear();
//! # });
//! ```

use crate::error::Result;
use crate::protocol::Reply;
use crate::pubsub::{Subscriber, SubscriberId};
use crate::store::MockStore;
use bytes::Bytes;
use std::time::Duration;

/// A command client bound to a [`MockStore`].
#[derive(Debug, Clone)]
pub struct MockClient {
    store: MockStore,
}

impl MockClient {
    /// Creates a client over `store`.
    pub fn new(store: MockStore) -> Self {
        Self { store }
    }

    /// Executes a command, like a client's `call("SET", key, value)`.
    pub fn call<I, A>(&self, command: &str, args: I) -> Result<Reply>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.store.execute(command, args)
    }

    /// Always true; there is no connection to lose.
    pub fn is_connected(&self) -> bool {
        true
    }

    /// Resets the whole store this client points at.
    pub fn clear(&self) {
        self.store.reset_all();
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &MockStore {
        &self.store
    }
}

/// A pub/sub client: a [`MockClient`] that also owns a [`Subscriber`].
///
/// Dropping the client drops its subscriber; its registrations stop
/// receiving messages and are pruned on the next publish.
#[derive(Debug)]
pub struct MockPubSubClient {
    client: MockClient,
    subscriber: Subscriber,
}

impl MockPubSubClient {
    /// Creates a pub/sub client over `store` with an empty inbox.
    pub fn new(store: MockStore) -> Self {
        let subscriber = store.subscriber();
        Self {
            client: MockClient::new(store),
            subscriber,
        }
    }

    /// Returns this client's subscriber id.
    pub fn id(&self) -> SubscriberId {
        self.subscriber.id()
    }

    /// Subscribes to each channel; returns the number of channels.
    pub fn subscribe<I, A>(&self, channels: I) -> usize
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.client.store.subscribe(&self.subscriber, channels)
    }

    /// Unsubscribes from each channel; returns the registrations removed.
    pub fn unsubscribe<I, A>(&self, channels: I) -> usize
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.client.store.unsubscribe(&self.subscriber, channels)
    }

    /// Waits for and returns the oldest undelivered message.
    pub async fn pop_message(&self) -> Bytes {
        self.subscriber.pop_message().await
    }

    /// Like [`pop_message`](Self::pop_message) with a deadline.
    pub async fn pop_message_timeout(&self, timeout: Duration) -> Option<Bytes> {
        self.subscriber.pop_message_timeout(timeout).await
    }

    /// Returns the number of messages waiting in the inbox.
    pub fn pending(&self) -> usize {
        self.subscriber.pending()
    }

    /// Executes a regular command through the same store.
    pub fn call<I, A>(&self, command: &str, args: I) -> Result<Reply>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.client.call(command, args)
    }

    /// Always true; there is no connection to lose.
    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    /// Resets the whole store this client points at.
    pub fn clear(&self) {
        self.client.clear();
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &MockStore {
        self.client.store()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client() {
        let client = MockClient::new(MockStore::new());
        assert!(client.is_connected());
        assert!(client.store().channels().is_empty());
    }

    #[test]
    fn test_subscribe_single() {
        let client = MockPubSubClient::new(MockStore::new());
        assert!(client.is_connected());

        assert_eq!(client.subscribe(["test"]), 1);
        assert_eq!(client.store().channels(), vec![Bytes::from("test")]);
    }

    #[test]
    fn test_subscribe_many() {
        let client = MockPubSubClient::new(MockStore::new());

        assert_eq!(client.subscribe(["foo", "bar"]), 2);
        assert_eq!(
            client.store().channels(),
            vec![Bytes::from("bar"), Bytes::from("foo")]
        );
    }

    #[tokio::test]
    async fn test_publish_from_other_client() {
        let store = MockStore::new();
        let listener = MockPubSubClient::new(store.clone());
        let publisher = MockClient::new(store.clone());

        listener.subscribe(["test"]);
        assert_eq!(listener.pending(), 0);
        assert_eq!(store.subscriber_count("test"), 1);

        publisher.call("PUBLISH", ["test", "message"]).unwrap();
        assert_eq!(listener.pop_message().await, Bytes::from("message"));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let store = MockStore::new();
        let listener = MockPubSubClient::new(store.clone());

        listener.subscribe(["a", "b"]);
        assert_eq!(listener.unsubscribe(["a", "never"]), 1);

        listener.call("PUBLISH", ["a", "lost"]).unwrap();
        listener.call("PUBLISH", ["b", "kept"]).unwrap();
        assert_eq!(listener.pending(), 1);
        assert_eq!(listener.pop_message().await, Bytes::from("kept"));
    }

    #[test]
    fn test_dropped_client_stops_counting() {
        let store = MockStore::new();
        let publisher = MockClient::new(store.clone());
        {
            let listener = MockPubSubClient::new(store.clone());
            listener.subscribe(["c"]);
            assert_eq!(
                publisher.call("PUBLISH", ["c", "m"]).unwrap(),
                Reply::integer(1)
            );
        }
        assert_eq!(
            publisher.call("PUBLISH", ["c", "m"]).unwrap(),
            Reply::integer(0)
        );
    }

    #[test]
    fn test_clear_resets_shared_store() {
        let store = MockStore::new();
        let client = MockClient::new(store.clone());
        let listener = MockPubSubClient::new(store.clone());

        client.call("SET", ["k", "v"]).unwrap();
        listener.subscribe(["c"]);

        listener.clear();
        assert!(store.channels().is_empty());
        assert_eq!(client.call("GET", ["k"]).unwrap(), Reply::Null);
    }
}
