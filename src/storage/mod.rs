//! Storage Engine Module
//!
//! This module provides the keyspace of a MockKV store: a map from key to
//! a tagged [`Value`] (string, hash or list) with an optional expiry time.
//!
//! ## Features
//!
//! - **Tagged Values**: Every command's coercion rule is an exhaustive match
//! - **Lazy Expiry**: Expired keys are dropped by the next read, never by a
//!   background task
//! - **Atomic Commands**: Each operation holds the keyspace lock for its
//!   entire read-modify-write
//!
//! ## Example
//!
//! ```
//! use mockkv::storage::StorageEngine;
//! use bytes::Bytes;
//! use std::time::Duration;
//!
//! let engine = StorageEngine::new();
//!
//! engine.hset(Bytes::from("user:1"), Bytes::from("name"), Bytes::from("Ariz"));
//! assert_eq!(engine.hget(b"user:1", b"name"), Some(Bytes::from("Ariz")));
//!
//! // Set with TTL
//! engine.set_with_ttl(
//!     Bytes::from("session"),
//!     Bytes::from("token123"),
//!     Duration::from_secs(3600)
//! );
//! ```

pub mod engine;

// Re-export commonly used types
pub use engine::{Entry, StorageEngine, StorageStats, Value};
