//! Publish/Subscribe Module
//!
//! Channel membership and message fan-out for MockKV.
//!
//! ## Architecture
//!
//! ```text
//!  PUBLISH c m
//!       │
//!       ▼
//! ┌─────────────────────┐      ┌──────────────┐
//! │  ChannelRegistry    │─────>│ Subscriber A │  inbox: [.., m]
//! │  "c" -> [A, B, A]   │─────>│ Subscriber B │  inbox: [.., m]
//! └─────────────────────┘      └──────────────┘
//!                                     │
//!                                     ▼
//!                              pop_message().await
//! ```
//!
//! The registry never owns a subscriber; it holds weak references used
//! only for delivery.

pub mod registry;
pub mod subscriber;

pub use registry::ChannelRegistry;
pub use subscriber::{Subscriber, SubscriberId};
