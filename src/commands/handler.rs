//! Command Handler Module
//!
//! This module implements the commands MockKV understands. A command
//! arrives as a name plus positional arguments, is resolved to a
//! [`Command`] variant, validated, and executed against the keyspace or
//! the channel registry.
//!
//! ## Supported Commands
//!
//! ### String / Key Commands
//! - `SET key value` - Set a key
//! - `SETEX key seconds value` - Set with expiry
//! - `GET key` - Raw stored value of a key (string, hash or list)
//! - `DEL key [key ...]` - Delete keys
//! - `EXISTS key [key ...]` - Count existing keys
//! - `EXPIRE key seconds` - Set expiry
//! - `PERSIST key` - Remove expiry
//! - `TTL key` - Remaining TTL in seconds
//! - `TYPE key` - "string", "hash", "list" or "none"
//!
//! ### Hash Commands
//! - `HMSET key field value [field value ...]` - Merge fields
//! - `HSET key field value` - Set one field, 1 if the field is new
//! - `HGET key field` - Get one field
//! - `HGETALL key` - Get all fields
//! - `HDEL key field [field ...]` - Remove fields
//!
//! ### List Commands
//! - `RPUSH key [value ...]` - Append to the tail of a list
//! - `LRANGE key start [stop]` - Get a range of elements (stop defaults to -1)
//!
//! ### Pub/Sub and Server Commands
//! - `PUBLISH channel message` - Deliver to subscribers
//! - `PING [message]` - Test connection
//! - `FLUSHDB` / `FLUSHALL` - Clear keyspace and channels
//!
//! ## Coercion
//!
//! Reading a key whose shape doesn't fit the command never fails: HGET and
//! HGETALL answer null, LRANGE answers an empty array. Writes that expect a
//! shape (HMSET, HSET, RPUSH) replace a mismatched value.

use crate::error::{Result, StoreError};
use crate::protocol::Reply;
use crate::pubsub::ChannelRegistry;
use crate::storage::{StorageEngine, Value};
use bytes::Bytes;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, debug_span, trace};

/// The closed set of supported commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Set,
    SetEx,
    Get,
    Del,
    Exists,
    Expire,
    Persist,
    Ttl,
    Type,
    HMSet,
    HSet,
    HGet,
    HGetAll,
    HDel,
    RPush,
    LRange,
    Publish,
    Ping,
    FlushDb,
}

impl Command {
    /// Every supported command, in documentation order.
    pub const ALL: [Command; 19] = [
        Command::Set,
        Command::SetEx,
        Command::Get,
        Command::Del,
        Command::Exists,
        Command::Expire,
        Command::Persist,
        Command::Ttl,
        Command::Type,
        Command::HMSet,
        Command::HSet,
        Command::HGet,
        Command::HGetAll,
        Command::HDel,
        Command::RPush,
        Command::LRange,
        Command::Publish,
        Command::Ping,
        Command::FlushDb,
    ];

    /// Returns the canonical upper-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Set => "SET",
            Command::SetEx => "SETEX",
            Command::Get => "GET",
            Command::Del => "DEL",
            Command::Exists => "EXISTS",
            Command::Expire => "EXPIRE",
            Command::Persist => "PERSIST",
            Command::Ttl => "TTL",
            Command::Type => "TYPE",
            Command::HMSet => "HMSET",
            Command::HSet => "HSET",
            Command::HGet => "HGET",
            Command::HGetAll => "HGETALL",
            Command::HDel => "HDEL",
            Command::RPush => "RPUSH",
            Command::LRange => "LRANGE",
            Command::Publish => "PUBLISH",
            Command::Ping => "PING",
            Command::FlushDb => "FLUSHDB",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = StoreError;

    /// Parses a command name, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        let upper = s.to_ascii_uppercase();
        if upper == "FLUSHALL" {
            return Ok(Command::FlushDb);
        }
        Command::ALL
            .into_iter()
            .find(|c| c.name() == upper)
            .ok_or_else(|| StoreError::UnknownCommand(s.to_string()))
    }
}

/// Executes commands against a keyspace and a channel registry.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    /// The keyspace
    storage: Arc<StorageEngine>,
    /// The pub/sub channels
    pubsub: Arc<ChannelRegistry>,
    /// Store name, recorded on every command span
    name: Arc<str>,
}

impl CommandHandler {
    /// Creates a new command handler over the given keyspace and channels.
    pub fn new(
        storage: Arc<StorageEngine>,
        pubsub: Arc<ChannelRegistry>,
        name: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            storage,
            pubsub,
            name: name.into(),
        }
    }

    /// Executes a command by name.
    ///
    /// # Arguments
    ///
    /// * `name` - The command name, case-insensitive
    /// * `args` - Positional arguments after the name (the key comes first)
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownCommand`] for a name outside the supported set,
    /// or one of the invalid-argument errors. Nothing is mutated when an
    /// error is returned.
    pub fn execute(&self, name: &str, args: &[Bytes]) -> Result<Reply> {
        let command = match name.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                debug!(store = %self.name, command = name, "Unknown command");
                return Err(e);
            }
        };

        let span = debug_span!("command", store = %self.name, command = %command);
        let _guard = span.enter();

        let result = self.dispatch(command, args);
        match &result {
            Ok(reply) => trace!(reply = ?reply, "Command executed"),
            Err(e) => debug!(error = %e, "Command rejected"),
        }
        result
    }

    /// Dispatches a command to its handler.
    fn dispatch(&self, command: Command, args: &[Bytes]) -> Result<Reply> {
        match command {
            Command::Set => self.cmd_set(args),
            Command::SetEx => self.cmd_setex(args),
            Command::Get => self.cmd_get(args),
            Command::Del => self.cmd_del(args),
            Command::Exists => self.cmd_exists(args),
            Command::Expire => self.cmd_expire(args),
            Command::Persist => self.cmd_persist(args),
            Command::Ttl => self.cmd_ttl(args),
            Command::Type => self.cmd_type(args),
            Command::HMSet => self.cmd_hmset(args),
            Command::HSet => self.cmd_hset(args),
            Command::HGet => self.cmd_hget(args),
            Command::HGetAll => self.cmd_hgetall(args),
            Command::HDel => self.cmd_hdel(args),
            Command::RPush => self.cmd_rpush(args),
            Command::LRange => self.cmd_lrange(args),
            Command::Publish => self.cmd_publish(args),
            Command::Ping => self.cmd_ping(args),
            Command::FlushDb => self.cmd_flushdb(args),
        }
    }

    /// Clears the keyspace and the channel registry.
    pub fn flush_all(&self) {
        self.storage.flush();
        self.pubsub.flush();
    }

    // ========================================================================
    // Helper functions
    // ========================================================================

    /// Parses an integer argument.
    fn parse_integer(arg: &Bytes) -> Result<i64> {
        std::str::from_utf8(arg)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(StoreError::NotAnInteger)
    }

    /// Parses a TTL argument given in seconds.
    fn parse_ttl(command: Command, arg: &Bytes) -> Result<Duration> {
        let seconds = Self::parse_integer(arg)?;
        u64::try_from(seconds)
            .map(Duration::from_secs)
            .map_err(|_| StoreError::InvalidExpireTime(command.name()))
    }

    /// Converts a raw stored value into its reply form.
    fn value_reply(value: Value) -> Reply {
        match value {
            Value::Str(data) => Reply::Bulk(data),
            Value::Hash(fields) => Reply::Map(fields),
            Value::List(items) => Reply::bulk_array(items),
        }
    }

    fn flag(set: bool) -> Reply {
        Reply::integer(i64::from(set))
    }

    // ========================================================================
    // String / Key Commands
    // ========================================================================

    /// SET key value
    fn cmd_set(&self, args: &[Bytes]) -> Result<Reply> {
        let [key, value] = args else {
            return Err(StoreError::WrongArity("SET"));
        };

        self.storage.set(key.clone(), value.clone());
        Ok(Reply::ok())
    }

    /// SETEX key seconds value
    fn cmd_setex(&self, args: &[Bytes]) -> Result<Reply> {
        let [key, seconds, value] = args else {
            return Err(StoreError::WrongArity("SETEX"));
        };

        let ttl = Self::parse_ttl(Command::SetEx, seconds)?;
        self.storage.set_with_ttl(key.clone(), value.clone(), ttl);
        Ok(Reply::ok())
    }

    /// GET key
    fn cmd_get(&self, args: &[Bytes]) -> Result<Reply> {
        let [key] = args else {
            return Err(StoreError::WrongArity("GET"));
        };

        Ok(self
            .storage
            .get(key)
            .map(Self::value_reply)
            .unwrap_or(Reply::Null))
    }

    /// DEL key [key ...]
    fn cmd_del(&self, args: &[Bytes]) -> Result<Reply> {
        if args.is_empty() {
            return Err(StoreError::WrongArity("DEL"));
        }

        let deleted = self.storage.delete_many(args);
        Ok(Reply::integer(deleted as i64))
    }

    /// EXISTS key [key ...]
    fn cmd_exists(&self, args: &[Bytes]) -> Result<Reply> {
        if args.is_empty() {
            return Err(StoreError::WrongArity("EXISTS"));
        }

        Ok(Reply::integer(self.storage.exists_many(args) as i64))
    }

    /// EXPIRE key seconds
    fn cmd_expire(&self, args: &[Bytes]) -> Result<Reply> {
        let [key, seconds] = args else {
            return Err(StoreError::WrongArity("EXPIRE"));
        };

        // A TTL at or below zero expires the key at once
        let seconds = Self::parse_integer(seconds)?;
        let ttl = Duration::from_secs(u64::try_from(seconds).unwrap_or(0));
        Ok(Self::flag(self.storage.expire(key, ttl)))
    }

    /// PERSIST key
    fn cmd_persist(&self, args: &[Bytes]) -> Result<Reply> {
        let [key] = args else {
            return Err(StoreError::WrongArity("PERSIST"));
        };

        Ok(Self::flag(self.storage.persist(key)))
    }

    /// TTL key
    fn cmd_ttl(&self, args: &[Bytes]) -> Result<Reply> {
        let [key] = args else {
            return Err(StoreError::WrongArity("TTL"));
        };

        Ok(Reply::integer(self.storage.ttl(key).unwrap_or(-2)))
    }

    /// TYPE key
    fn cmd_type(&self, args: &[Bytes]) -> Result<Reply> {
        let [key] = args else {
            return Err(StoreError::WrongArity("TYPE"));
        };

        Ok(Reply::status(self.storage.key_type(key)))
    }

    // ========================================================================
    // Hash Commands
    // ========================================================================

    /// HMSET key field value [field value ...]
    fn cmd_hmset(&self, args: &[Bytes]) -> Result<Reply> {
        let Some((key, rest)) = args.split_first() else {
            return Err(StoreError::WrongArity("HMSET"));
        };
        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err(StoreError::WrongArity("HMSET"));
        }

        let pairs = rest
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();
        self.storage.hmset(key.clone(), pairs);
        Ok(Reply::ok())
    }

    /// HSET key field value
    fn cmd_hset(&self, args: &[Bytes]) -> Result<Reply> {
        let [key, field, value] = args else {
            return Err(StoreError::WrongArity("HSET"));
        };

        let created = self
            .storage
            .hset(key.clone(), field.clone(), value.clone());
        Ok(Self::flag(created))
    }

    /// HGET key field
    fn cmd_hget(&self, args: &[Bytes]) -> Result<Reply> {
        let [key, field] = args else {
            return Err(StoreError::WrongArity("HGET"));
        };

        Ok(Reply::from(self.storage.hget(key, field)))
    }

    /// HGETALL key
    fn cmd_hgetall(&self, args: &[Bytes]) -> Result<Reply> {
        let [key] = args else {
            return Err(StoreError::WrongArity("HGETALL"));
        };

        Ok(self
            .storage
            .hgetall(key)
            .map(Reply::Map)
            .unwrap_or(Reply::Null))
    }

    /// HDEL key field [field ...]
    fn cmd_hdel(&self, args: &[Bytes]) -> Result<Reply> {
        let Some((key, fields)) = args.split_first() else {
            return Err(StoreError::WrongArity("HDEL"));
        };
        if fields.is_empty() {
            return Err(StoreError::WrongArity("HDEL"));
        }

        Ok(Reply::integer(self.storage.hdel(key, fields) as i64))
    }

    // ========================================================================
    // List Commands
    // ========================================================================

    /// RPUSH key [value ...]
    fn cmd_rpush(&self, args: &[Bytes]) -> Result<Reply> {
        let Some((key, values)) = args.split_first() else {
            return Err(StoreError::WrongArity("RPUSH"));
        };

        let len = self.storage.rpush(key.clone(), values.to_vec());
        Ok(Reply::integer(len as i64))
    }

    /// LRANGE key start [stop]
    fn cmd_lrange(&self, args: &[Bytes]) -> Result<Reply> {
        let (key, start, stop) = match args {
            [key, start] => (key, Self::parse_integer(start)?, -1),
            [key, start, stop] => (
                key,
                Self::parse_integer(start)?,
                Self::parse_integer(stop)?,
            ),
            _ => return Err(StoreError::WrongArity("LRANGE")),
        };

        Ok(Reply::bulk_array(self.storage.lrange(key, start, stop)))
    }

    // ========================================================================
    // Pub/Sub and Server Commands
    // ========================================================================

    /// PUBLISH channel message
    fn cmd_publish(&self, args: &[Bytes]) -> Result<Reply> {
        let [channel, message] = args else {
            return Err(StoreError::WrongArity("PUBLISH"));
        };

        let receivers = self.pubsub.publish(channel.clone(), message.clone());
        debug!(channel = ?channel, receivers, "Published message");
        Ok(Reply::integer(receivers as i64))
    }

    /// PING [message]
    fn cmd_ping(&self, args: &[Bytes]) -> Result<Reply> {
        match args {
            [] => Ok(Reply::pong()),
            [message] => Ok(Reply::Bulk(message.clone())),
            _ => Err(StoreError::WrongArity("PING")),
        }
    }

    /// FLUSHDB / FLUSHALL
    fn cmd_flushdb(&self, args: &[Bytes]) -> Result<Reply> {
        if !args.is_empty() {
            return Err(StoreError::WrongArity("FLUSHDB"));
        }

        self.flush_all();
        Ok(Reply::ok())
    }
}
