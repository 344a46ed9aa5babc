//! # MockKV - An In-Process Key-Value Store for Tests
//!
//! MockKV emulates a subset of a Redis-style store's commands (strings,
//! hashes, lists, expiry and publish/subscribe) inside the test process,
//! so code written against a store client can be tested without a server.
//!
//! ## Features
//!
//! - **Typed Values**: Strings, hashes and lists with the usual coercion rules
//! - **TTL Support**: Lazy expiry on read, driven by the tokio clock
//! - **Pub/Sub**: Ordered fan-out with an async, cancellable blocking pop
//! - **Injectable**: No globals; every test builds its own [`MockStore`]
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                            MockStore                                │
//! │                                                                     │
//! │  ┌─────────────┐    ┌─────────────┐    ┌────────────────────────┐   │
//! │  │ MockClient  │───>│  Command    │───>│    StorageEngine       │   │
//! │  │ (call)      │    │  Handler    │    │  key -> Entry{Value,   │   │
//! │  └─────────────┘    └──────┬──────┘    │          expires_at}   │   │
//! │                            │           └────────────────────────┘   │
//! │                            │ PUBLISH                                │
//! │                            ▼                                        │
//! │  ┌─────────────┐    ┌─────────────────┐                             │
//! │  │ MockPubSub  │───>│ ChannelRegistry │──> Subscriber inboxes       │
//! │  │ Client      │    │ chan -> [subs]  │                             │
//! │  └─────────────┘    └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use mockkv::{MockStore, Reply};
//! use bytes::Bytes;
//!
//! # tokio_test::block_on(async {
//! // One store per test
//! let store = MockStore::new();
//!
//! store.execute("SETEX", ["session", "60", "token"]).unwrap();
//! assert_eq!(store.execute("GET", ["session"]).unwrap(), Reply::bulk("token"));
//!
//! let subscriber = store.subscriber();
//! store.subscribe(&subscriber, ["jobs"]);
//! store.execute("PUBLISH", ["jobs", "job-1"]).unwrap();
//! assert_eq!(subscriber.pop_message().await, Bytes::from("job-1"));
//!
//! // Teardown
//! store.reset_all();
//! # });
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: Reply values
//! - [`storage`]: Keyspace with lazy expiry
//! - [`pubsub`]: Channel registry and subscribers
//! - [`commands`]: Command parsing and dispatch
//! - [`client`]: Command and pub/sub clients over a shared store

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod protocol;
pub mod pubsub;
pub mod storage;
pub mod store;

// Re-export commonly used types for convenience
pub use client::{MockClient, MockPubSubClient};
pub use commands::{Command, CommandHandler};
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use protocol::Reply;
pub use pubsub::{ChannelRegistry, Subscriber, SubscriberId};
pub use storage::{StorageEngine, StorageStats, Value};
pub use store::{MockStore, StoreStats};

/// Version of MockKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
