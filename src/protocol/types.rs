//! Reply Types
//!
//! This module defines the values a command hands back to its caller.
//! The shapes follow what a Redis client library would decode off the
//! wire, minus the wire itself:
//!
//! - Status: `OK`, `PONG`
//! - Integer: counts, lengths, TTLs
//! - Bulk: a stored string or a published message
//! - Null: absent, expired or shape-mismatched key
//! - Array: list contents (LRANGE, GET on a list key)
//! - Map: hash contents (HGETALL, GET on a hash key)

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;

/// Represents the result of executing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Acknowledgement token such as `OK` or `PONG`
    Status(String),

    /// 64-bit signed integer
    Integer(i64),

    /// Binary-safe string
    Bulk(Bytes),

    /// No value
    Null,

    /// Ordered sequence of replies
    Array(Vec<Reply>),

    /// Field/value mapping of a hash key
    Map(HashMap<Bytes, Bytes>),
}

impl Reply {
    /// Creates a new status reply.
    ///
    /// # Example
    /// ```
    /// use mockkv::protocol::Reply;
    /// let ok = Reply::status("OK");
    /// assert_eq!(ok, Reply::ok());
    /// ```
    pub fn status(s: impl Into<String>) -> Self {
        Reply::Status(s.into())
    }

    /// Creates a new integer reply.
    pub fn integer(n: i64) -> Self {
        Reply::Integer(n)
    }

    /// Creates a new bulk reply.
    ///
    /// # Example
    /// ```
    /// use mockkv::protocol::Reply;
    /// use bytes::Bytes;
    /// let bulk = Reply::bulk(Bytes::from("hello"));
    /// assert_eq!(bulk.as_bytes(), Some(&b"hello"[..]));
    /// ```
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Reply::Bulk(data.into())
    }

    /// Creates a null reply.
    pub fn null() -> Self {
        Reply::Null
    }

    /// Creates an array reply.
    pub fn array(values: Vec<Reply>) -> Self {
        Reply::Array(values)
    }

    /// Creates an array of bulk replies from raw items.
    pub fn bulk_array<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
    {
        Reply::Array(items.into_iter().map(Reply::Bulk).collect())
    }

    /// Creates a map reply.
    pub fn map(fields: HashMap<Bytes, Bytes>) -> Self {
        Reply::Map(fields)
    }

    /// Common reply for successful writes
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    /// Common reply for PING
    pub fn pong() -> Self {
        Reply::Status("PONG".to_string())
    }

    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Reply::Null)
    }

    /// Attempts to extract the inner string from Status or Bulk.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Status(s) => Some(s),
            Reply::Bulk(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Attempts to extract the inner bytes from Bulk.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::Bulk(b) => Some(b),
            _ => None,
        }
    }

    /// Attempts to extract the inner integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract the inner array.
    pub fn as_array(&self) -> Option<&[Reply]> {
        match self {
            Reply::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Attempts to extract the inner map.
    pub fn as_map(&self) -> Option<&HashMap<Bytes, Bytes>> {
        match self {
            Reply::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Consumes self and returns the inner array if this is an Array variant.
    pub fn into_array(self) -> Option<Vec<Reply>> {
        match self {
            Reply::Array(arr) => Some(arr),
            _ => None,
        }
    }
}

impl From<Option<Bytes>> for Reply {
    fn from(value: Option<Bytes>) -> Self {
        value.map(Reply::Bulk).unwrap_or(Reply::Null)
    }
}

fn write_bytes(f: &mut fmt::Formatter<'_>, data: &[u8]) -> fmt::Result {
    match std::str::from_utf8(data) {
        Ok(s) => write!(f, "\"{}\"", s),
        Err(_) => write!(f, "(binary data, {} bytes)", data.len()),
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Status(s) => write!(f, "{}", s),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(data) => write_bytes(f, data),
            Reply::Null => write!(f, "(nil)"),
            Reply::Array(values) => {
                if values.is_empty() {
                    write!(f, "(empty array)")
                } else {
                    writeln!(f)?;
                    for (i, v) in values.iter().enumerate() {
                        writeln!(f, "{}) {}", i + 1, v)?;
                    }
                    Ok(())
                }
            }
            Reply::Map(fields) => {
                if fields.is_empty() {
                    return write!(f, "(empty hash)");
                }
                // Sorted so the rendering is stable across runs
                let mut pairs: Vec<_> = fields.iter().collect();
                pairs.sort();
                writeln!(f)?;
                for (field, value) in pairs {
                    write_bytes(f, field)?;
                    write!(f, " => ")?;
                    write_bytes(f, value)?;
                    writeln!(f)?;
                }
                Ok(())
            }
        }
    }
}
