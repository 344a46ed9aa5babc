//! Command Handler Module
//!
//! This module implements the command layer of MockKV. It resolves a
//! command name to a [`Command`], validates the arguments, executes it
//! against the keyspace or the channel registry, and returns a reply.
//!
//! ## Architecture
//!
//! ```text
//! execute("HSET", [key, field, value])
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Parse name   │
//! │  - Validate     │
//! │  - Dispatch     │
//! └───────┬─────────┘
//!         │
//!    ┌────┴──────────────┐
//!    ▼                   ▼
//! ┌───────────────┐ ┌─────────────────┐
//! │ StorageEngine │ │ ChannelRegistry │
//! └───────────────┘ └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - Strings and keys: `SET`, `SETEX`, `GET`, `DEL`, `EXISTS`, `EXPIRE`,
//!   `PERSIST`, `TTL`, `TYPE`
//! - Hashes: `HMSET`, `HSET`, `HGET`, `HGETALL`, `HDEL`
//! - Lists: `RPUSH`, `LRANGE`
//! - Pub/sub and server: `PUBLISH`, `PING`, `FLUSHDB`, `FLUSHALL`

pub mod handler;

// Re-export the main command types
pub use handler::{Command, CommandHandler};
