//! Store configuration.

/// Default name attached to a store's log events
pub const DEFAULT_STORE_NAME: &str = "mockkv";

/// Default initial capacity of a subscriber inbox
pub const DEFAULT_INBOX_CAPACITY: usize = 16;

/// Configuration for a [`MockStore`](crate::MockStore).
///
/// # Example
///
/// ```
/// use mockkv::{MockStore, StoreConfig};
///
/// let store = MockStore::with_config(StoreConfig {
///     name: "orders-test".to_string(),
///     ..Default::default()
/// });
/// assert_eq!(store.name(), "orders-test");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Name recorded on every tracing event of the store, so stores built
    /// by tests running in parallel can be told apart in the logs
    pub name: String,

    /// Initial capacity of each subscriber inbox (default: 16)
    pub inbox_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_STORE_NAME.to_string(),
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.name, "mockkv");
        assert_eq!(config.inbox_capacity, 16);
    }
}
