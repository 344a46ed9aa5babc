//! The injectable store object.
//!
//! A [`MockStore`] is a cheap-to-clone handle on one keyspace and one
//! channel registry. A test harness builds one per test (or shares one
//! across a group of clients), drives it, and calls
//! [`reset_all`](MockStore::reset_all) on teardown.

use crate::commands::CommandHandler;
use crate::config::StoreConfig;
use crate::error::Result;
use crate::protocol::Reply;
use crate::pubsub::{ChannelRegistry, Subscriber};
use crate::storage::{StorageEngine, StorageStats};
use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Converts caller-supplied arguments into owned byte strings.
fn to_bytes<I, A>(args: I) -> Vec<Bytes>
where
    I: IntoIterator<Item = A>,
    A: AsRef<[u8]>,
{
    args.into_iter()
        .map(|a| Bytes::copy_from_slice(a.as_ref()))
        .collect()
}

/// Store-wide statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Keyspace statistics
    pub storage: StorageStats,
    /// Commands executed, successful or not
    pub commands: u64,
    /// Messages appended to subscriber inboxes
    pub delivered: u64,
}

/// An in-process emulation of a Redis-style store.
///
/// Clones share the same keyspace and channels.
///
/// # Example
///
/// ```
/// use mockkv::{MockStore, Reply};
///
/// let store = MockStore::new();
///
/// store.execute("HMSET", ["user:1", "name", "Ariz", "lang", "rust"]).unwrap();
/// assert_eq!(
///     store.execute("HGET", ["user:1", "name"]).unwrap(),
///     Reply::bulk("Ariz")
/// );
///
/// store.reset_all();
/// assert_eq!(store.execute("HGET", ["user:1", "name"]).unwrap(), Reply::Null);
/// ```
#[derive(Debug, Clone)]
pub struct MockStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: StoreConfig,
    storage: Arc<StorageEngine>,
    pubsub: Arc<ChannelRegistry>,
    handler: CommandHandler,
    command_count: AtomicU64,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Creates an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates an empty store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        let storage = Arc::new(StorageEngine::new());
        let pubsub = Arc::new(ChannelRegistry::new());
        let handler = CommandHandler::new(
            Arc::clone(&storage),
            Arc::clone(&pubsub),
            config.name.as_str(),
        );
        debug!(store = %config.name, "Store created");

        Self {
            inner: Arc::new(Inner {
                config,
                storage,
                pubsub,
                handler,
                command_count: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the store's name.
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Returns the store's configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Executes a command.
    ///
    /// `args` are the positional arguments after the command name, key
    /// first. Anything byte-like works: `&str`, `String`, `Bytes`,
    /// `Vec<u8>`.
    ///
    /// # Errors
    ///
    /// See [`CommandHandler::execute`].
    pub fn execute<I, A>(&self, command: &str, args: I) -> Result<Reply>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.inner.command_count.fetch_add(1, Ordering::Relaxed);
        self.inner.handler.execute(command, &to_bytes(args))
    }

    /// Creates a subscriber sized by this store's configuration.
    pub fn subscriber(&self) -> Subscriber {
        Subscriber::with_capacity(self.inner.config.inbox_capacity)
    }

    /// Registers `subscriber` on each channel.
    ///
    /// # Returns
    ///
    /// The number of channels subscribed.
    pub fn subscribe<I, A>(&self, subscriber: &Subscriber, channels: I) -> usize
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.inner.pubsub.subscribe(subscriber, &to_bytes(channels))
    }

    /// Removes one registration of `subscriber` from each channel.
    ///
    /// # Returns
    ///
    /// The number of registrations removed; 0 for channels never joined.
    pub fn unsubscribe<I, A>(&self, subscriber: &Subscriber, channels: I) -> usize
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.inner.pubsub.unsubscribe(subscriber, &to_bytes(channels))
    }

    /// Returns the names of all known channels, sorted.
    pub fn channels(&self) -> Vec<Bytes> {
        self.inner.pubsub.channels()
    }

    /// Returns the number of live registrations on a channel.
    pub fn subscriber_count(&self, channel: impl AsRef<[u8]>) -> usize {
        self.inner.pubsub.subscriber_count(channel.as_ref())
    }

    /// Clears the keyspace and the channel registry.
    ///
    /// Harnesses call this between independent test cases.
    pub fn reset_all(&self) {
        self.inner.handler.flush_all();
        info!(store = %self.name(), "Store reset");
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            storage: self.inner.storage.stats(),
            commands: self.inner.command_count.load(Ordering::Relaxed),
            delivered: self.inner.pubsub.delivered(),
        }
    }
}
