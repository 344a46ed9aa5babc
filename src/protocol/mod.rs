//! Command Replies
//!
//! MockKV speaks the command protocol of a Redis-style store without the
//! network framing: a command goes in as a name plus positional
//! arguments, and a [`Reply`] comes back.
//!
//! ## Example
//!
//! ```
//! use mockkv::protocol::Reply;
//!
//! let reply = Reply::integer(2);
//! assert_eq!(reply.as_integer(), Some(2));
//! ```

pub mod types;

pub use types::Reply;
