//! Error types for MockKV.
//!
//! Only hard failures live here: an unknown command name or arguments the
//! command cannot accept. Reading a key whose stored shape doesn't match
//! the command (HGET on a list, LRANGE on a string, ...) is not an error;
//! those commands answer with a null or empty reply instead.

use thiserror::Error;

/// Errors returned by [`MockStore::execute`](crate::MockStore::execute).
///
/// No variant is ever produced after a mutation has been applied, so a
/// failed command leaves the keyspace untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The command name is not in the supported set
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    /// Wrong number of positional arguments for the command
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),

    /// A numeric argument (TTL, list index) didn't parse as an integer
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    /// A TTL argument was negative
    #[error("ERR invalid expire time in '{0}' command")]
    InvalidExpireTime(&'static str),
}

impl StoreError {
    /// Returns true for the malformed-argument family of errors
    /// (everything except an unknown command name).
    pub fn is_invalid_arguments(&self) -> bool {
        !matches!(self, StoreError::UnknownCommand(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            StoreError::UnknownCommand("FOO".into()).to_string(),
            "ERR unknown command 'FOO'"
        );
        assert_eq!(
            StoreError::WrongArity("HGET").to_string(),
            "ERR wrong number of arguments for 'HGET' command"
        );
    }

    #[test]
    fn test_invalid_arguments_family() {
        assert!(StoreError::WrongArity("HSET").is_invalid_arguments());
        assert!(StoreError::NotAnInteger.is_invalid_arguments());
        assert!(StoreError::InvalidExpireTime("SETEX").is_invalid_arguments());
        assert!(!StoreError::UnknownCommand("X".into()).is_invalid_arguments());
    }
}
