//! Keyspace Engine with Lazy Expiry
//!
//! This module implements the keyspace behind MockKV. Every key maps to
//! exactly one [`Entry`], whose [`Value`] is a string, a hash, or a list.
//!
//! ## Design Decisions
//!
//! 1. **One Lock**: The whole keyspace sits behind a single mutex, held
//!    for the full read-modify-write of each operation. Every operation is
//!    atomic with respect to every other.
//! 2. **Lazy Expiry Only**: There is no background sweeper. A key whose
//!    TTL has passed is dropped by the next operation that reads it.
//! 3. **One Resolver**: Every operation that needs "the current value"
//!    goes through `StorageEngine::resolve`, so the expiry rule lives in
//!    exactly one place.
//!
//! ## TTL Rules
//!
//! ```text
//! SET, HMSET, HSET, RPUSH(≥1 value)  -> stored without TTL
//! SETEX, EXPIRE                      -> stored with TTL
//! PERSIST                            -> TTL cleared
//! HDEL, RPUSH(0 values)              -> TTL untouched
//! ```
//!
//! Expiry timestamps are [`tokio::time::Instant`]s, so tests running on a
//! paused tokio clock can move time forward with `tokio::time::advance`.

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// The shape of a stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Plain binary-safe string
    Str(Bytes),
    /// Field/value mapping
    Hash(HashMap<Bytes, Bytes>),
    /// Ordered sequence
    List(Vec<Bytes>),
}

impl Value {
    /// Returns the type name reported by TYPE.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Hash(_) => "hash",
            Value::List(_) => "list",
        }
    }
}

/// Represents a stored value with optional expiry time.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The actual value stored
    pub value: Value,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl Entry {
    /// Creates a new entry without expiry.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Creates a new entry with TTL.
    ///
    /// A TTL too large to represent never expires.
    pub fn with_ttl(value: Value, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    /// Checks if this entry has expired.
    ///
    /// An entry stored with TTL `t` is live for elapsed time `< t` and
    /// expired from `t` onwards.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| Instant::now() >= exp)
            .unwrap_or(false)
    }

    /// Returns the remaining TTL in whole seconds, or None if no expiry.
    pub fn ttl_secs(&self) -> Option<u64> {
        self.expires_at
            .map(|exp| exp.saturating_duration_since(Instant::now()).as_secs())
    }
}

/// The keyspace of a MockKV store.
///
/// # Example
///
/// ```
/// use mockkv::storage::{StorageEngine, Value};
/// use bytes::Bytes;
///
/// let engine = StorageEngine::new();
/// engine.set(Bytes::from("name"), Bytes::from("Ariz"));
/// assert_eq!(
///     engine.get(b"name"),
///     Some(Value::Str(Bytes::from("Ariz")))
/// );
/// ```
pub struct StorageEngine {
    /// Key -> entry
    data: Mutex<HashMap<Bytes, Entry>>,

    /// Statistics: total read operations
    read_count: AtomicU64,

    /// Statistics: total write operations
    write_count: AtomicU64,

    /// Statistics: keys removed by DEL
    del_count: AtomicU64,

    /// Statistics: keys dropped by lazy expiry
    expired_count: AtomicU64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("keys", &self.data.lock().len())
            .field("read_count", &self.read_count.load(Ordering::Relaxed))
            .field("write_count", &self.write_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates a new, empty keyspace.
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            read_count: AtomicU64::new(0),
            write_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    /// Looks up the live entry for a key.
    ///
    /// This is the single place where expiry is enforced: an expired
    /// entry is removed from the map and reported as absent.
    fn resolve<'a>(
        &self,
        data: &'a mut HashMap<Bytes, Entry>,
        key: &[u8],
    ) -> Option<&'a mut Entry> {
        if data.get(key).is_some_and(Entry::is_expired) {
            data.remove(key);
            self.expired_count.fetch_add(1, Ordering::Relaxed);
            trace!(key = ?Bytes::copy_from_slice(key), "Lazily expired key");
            return None;
        }
        data.get_mut(key)
    }

    #[inline]
    fn record_read(&self) {
        self.read_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_write(&self) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
    }

    // ========================================================================
    // STRING / KEY OPERATIONS
    // ========================================================================

    /// Stores a string without expiry, replacing whatever was at the key.
    pub fn set(&self, key: Bytes, value: Bytes) {
        self.record_write();
        self.data.lock().insert(key, Entry::new(Value::Str(value)));
    }

    /// Stores a string that expires after `ttl`.
    pub fn set_with_ttl(&self, key: Bytes, value: Bytes, ttl: Duration) {
        self.record_write();
        self.data
            .lock()
            .insert(key, Entry::with_ttl(Value::Str(value), ttl));
    }

    /// Returns the raw stored value of a key, whatever its shape.
    ///
    /// Returns `None` if the key doesn't exist or has expired; in the
    /// latter case the key is removed.
    pub fn get(&self, key: &[u8]) -> Option<Value> {
        self.record_read();
        let mut data = self.data.lock();
        self.resolve(&mut data, key).map(|e| e.value.clone())
    }

    /// Deletes the given keys.
    ///
    /// # Returns
    ///
    /// Returns the number of keys that were actually removed. Expired
    /// keys are not counted.
    pub fn delete_many(&self, keys: &[Bytes]) -> u64 {
        let mut data = self.data.lock();
        let mut deleted = 0;
        for key in keys {
            if self.resolve(&mut data, key).is_some() {
                data.remove(key);
                deleted += 1;
            }
        }
        self.del_count.fetch_add(deleted, Ordering::Relaxed);
        deleted
    }

    /// Counts how many of the given keys exist (duplicates count twice).
    pub fn exists_many(&self, keys: &[Bytes]) -> u64 {
        self.record_read();
        let mut data = self.data.lock();
        keys.iter()
            .filter(|k| self.resolve(&mut data, k).is_some())
            .count() as u64
    }

    /// Sets a TTL on an existing key, keeping its value.
    ///
    /// # Returns
    ///
    /// Returns `true` if the TTL was set, `false` if the key doesn't exist.
    pub fn expire(&self, key: &[u8], ttl: Duration) -> bool {
        self.record_write();
        let mut data = self.data.lock();
        match self.resolve(&mut data, key) {
            Some(entry) => {
                entry.expires_at = Instant::now().checked_add(ttl);
                true
            }
            None => false,
        }
    }

    /// Clears the TTL of an existing key, keeping its value.
    ///
    /// # Returns
    ///
    /// Returns `true` if the key exists (with or without a TTL before),
    /// `false` if it doesn't.
    pub fn persist(&self, key: &[u8]) -> bool {
        self.record_write();
        let mut data = self.data.lock();
        match self.resolve(&mut data, key) {
            Some(entry) => {
                entry.expires_at = None;
                true
            }
            None => false,
        }
    }

    /// Gets the remaining TTL for a key in seconds.
    ///
    /// # Returns
    ///
    /// - `Some(seconds)` if the key exists and has an expiry
    /// - `Some(-1)` if the key exists but has no expiry
    /// - `None` if the key doesn't exist
    pub fn ttl(&self, key: &[u8]) -> Option<i64> {
        self.record_read();
        let mut data = self.data.lock();
        self.resolve(&mut data, key)
            .map(|entry| entry.ttl_secs().map(|s| s as i64).unwrap_or(-1))
    }

    /// Returns the type of a key ("string", "hash", "list", or "none").
    pub fn key_type(&self, key: &[u8]) -> &'static str {
        self.record_read();
        let mut data = self.data.lock();
        self.resolve(&mut data, key)
            .map(|entry| entry.value.type_name())
            .unwrap_or("none")
    }

    // ========================================================================
    // HASH OPERATIONS
    // ========================================================================

    /// Merges field/value pairs into the hash at `key`.
    ///
    /// A missing key, or a key holding something other than a hash, starts
    /// from an empty hash. The merged hash is stored without TTL.
    pub fn hmset(&self, key: Bytes, pairs: Vec<(Bytes, Bytes)>) {
        self.record_write();
        let mut data = self.data.lock();
        self.merge_fields(&mut data, key, pairs);
    }

    fn merge_fields(
        &self,
        data: &mut HashMap<Bytes, Entry>,
        key: Bytes,
        pairs: Vec<(Bytes, Bytes)>,
    ) {
        let mut fields = match self.resolve(data, &key).map(|e| &mut e.value) {
            Some(Value::Hash(fields)) => std::mem::take(fields),
            _ => HashMap::new(),
        };
        fields.extend(pairs);
        data.insert(key, Entry::new(Value::Hash(fields)));
    }

    /// Sets a single hash field.
    ///
    /// # Returns
    ///
    /// Returns `true` if the field is new, `false` if it already existed
    /// and was overwritten.
    pub fn hset(&self, key: Bytes, field: Bytes, value: Bytes) -> bool {
        self.record_write();
        let mut data = self.data.lock();
        let existed = matches!(
            self.resolve(&mut data, &key).map(|e| &e.value),
            Some(Value::Hash(fields)) if fields.contains_key(&field)
        );
        self.merge_fields(&mut data, key, vec![(field, value)]);
        !existed
    }

    /// Returns a single hash field.
    ///
    /// `None` if the key is absent, expired, not a hash, or lacks the field.
    pub fn hget(&self, key: &[u8], field: &[u8]) -> Option<Bytes> {
        self.record_read();
        let mut data = self.data.lock();
        match self.resolve(&mut data, key).map(|e| &e.value) {
            Some(Value::Hash(fields)) => fields.get(field).cloned(),
            _ => None,
        }
    }

    /// Returns all fields of a hash.
    ///
    /// `None` if the key is absent, expired, or not a hash.
    pub fn hgetall(&self, key: &[u8]) -> Option<HashMap<Bytes, Bytes>> {
        self.record_read();
        let mut data = self.data.lock();
        match self.resolve(&mut data, key).map(|e| &e.value) {
            Some(Value::Hash(fields)) => Some(fields.clone()),
            _ => None,
        }
    }

    /// Removes fields from a hash, deleting the key once the hash is empty.
    ///
    /// # Returns
    ///
    /// The number of fields removed.
    pub fn hdel(&self, key: &[u8], fields: &[Bytes]) -> u64 {
        self.record_write();
        let mut data = self.data.lock();
        let (removed, now_empty) = match self.resolve(&mut data, key).map(|e| &mut e.value) {
            Some(Value::Hash(hash)) => {
                let removed = fields.iter().filter(|f| hash.remove(*f).is_some()).count();
                (removed as u64, hash.is_empty())
            }
            _ => return 0,
        };
        if now_empty {
            data.remove(key);
        }
        removed
    }

    // ========================================================================
    // LIST OPERATIONS
    // ========================================================================

    /// Appends values to the tail of the list at `key`.
    ///
    /// A missing key, or a key holding something other than a list, starts
    /// from an empty list. With at least one value the list is stored back
    /// without TTL; with none, nothing is written.
    ///
    /// # Returns
    /// The length of the list after the push.
    pub fn rpush(&self, key: Bytes, values: Vec<Bytes>) -> usize {
        self.record_write();
        let mut data = self.data.lock();

        let current = self.resolve(&mut data, &key).map(|e| &mut e.value);
        if values.is_empty() {
            return match current {
                Some(Value::List(items)) => items.len(),
                _ => 0,
            };
        }

        let mut items = match current {
            Some(Value::List(items)) => std::mem::take(items),
            _ => Vec::new(),
        };
        items.extend(values);
        let len = items.len();
        data.insert(key, Entry::new(Value::List(items)));
        len
    }

    /// Returns the elements between `start` and `stop`, both inclusive.
    ///
    /// Negative indices count from the end (-1 is the last element).
    /// Out-of-range bounds are clamped; a missing or non-list key reads as
    /// an empty list.
    pub fn lrange(&self, key: &[u8], start: i64, stop: i64) -> Vec<Bytes> {
        self.record_read();
        let mut data = self.data.lock();
        match self.resolve(&mut data, key).map(|e| &e.value) {
            Some(Value::List(items)) => match normalize_range(items.len(), start, stop) {
                Some((from, to)) => items[from..to].to_vec(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    // ========================================================================
    // MAINTENANCE
    // ========================================================================

    /// Clears all data from the keyspace.
    pub fn flush(&self) {
        self.data.lock().clear();
    }

    /// Returns the number of stored keys, including expired keys that
    /// haven't been read since they expired.
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if the keyspace is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns keyspace statistics.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.len() as u64,
            read_ops: self.read_count.load(Ordering::Relaxed),
            write_ops: self.write_count.load(Ordering::Relaxed),
            deleted: self.del_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

/// Turns inclusive LRANGE bounds into a `[from, to)` slice range.
///
/// `stop == -1` (or any stop past the end) means "through the last
/// element". Returns `None` when the range selects nothing.
fn normalize_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    if start >= len {
        return None;
    }

    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if stop < start {
        return None;
    }

    Some((start as usize, stop as usize + 1))
}

/// Keyspace statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of keys currently stored
    pub keys: u64,
    /// Total read operations
    pub read_ops: u64,
    /// Total write operations
    pub write_ops: u64,
    /// Keys removed by DEL
    pub deleted: u64,
    /// Keys dropped by lazy expiry
    pub expired: u64,
}
