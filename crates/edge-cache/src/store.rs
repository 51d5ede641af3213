//! Query cache storage backends.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::key::QueryKey;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache operation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CacheError {
    /// Failed to serialize/deserialize cache entry.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend storage error.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Where the data in a query result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Served from a fresh entry, no fetch.
    Hit,
    /// Fetched from upstream.
    Miss,
    /// Refetch failed; served the previous entry.
    Stale,
    /// No data at all.
    Error,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Stale => write!(f, "STALE"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A cached query result: JSON-encoded data and when it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEntry {
    /// The JSON-encoded record.
    pub data: String,
    /// Fetch time, milliseconds since the Unix epoch.
    pub fetched_at_ms: u64,
}

impl CachedEntry {
    /// Create a new entry.
    pub fn new(data: impl Into<String>, fetched_at_ms: u64) -> Self {
        Self {
            data: data.into(),
            fetched_at_ms,
        }
    }

    /// Whether the entry is still inside the staleness window at `now_ms`.
    pub fn is_fresh(&self, now_ms: u64, stale_time: Duration) -> bool {
        now_ms.saturating_sub(self.fetched_at_ms) < stale_time.as_millis() as u64
    }

    /// Age in milliseconds at `now_ms`.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.fetched_at_ms)
    }
}

/// Query cache storage backend.
///
/// Entries are only ever replaced wholesale.
pub trait QueryStore {
    /// Get a cached entry.
    fn get(&self, key: &QueryKey) -> CacheResult<Option<CachedEntry>>;

    /// Store an entry, replacing any previous one.
    fn set(&self, key: &QueryKey, entry: CachedEntry) -> CacheResult<()>;

    /// Delete an entry.
    fn remove(&self, key: &QueryKey) -> CacheResult<()>;
}

/// In-process backend. Lives as long as the `QueryClient` that owns it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<QueryKey, CachedEntry>>,
}

impl MemoryStore {
    /// Create a new in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl QueryStore for MemoryStore {
    fn get(&self, key: &QueryKey) -> CacheResult<Option<CachedEntry>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &QueryKey, entry: CachedEntry) -> CacheResult<()> {
        self.entries.borrow_mut().insert(key.clone(), entry);
        Ok(())
    }

    fn remove(&self, key: &QueryKey) -> CacheResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Spin key-value backend. Entries survive across component instances.
#[cfg(target_arch = "wasm32")]
pub struct KvStore {
    store: spin_sdk::key_value::Store,
    prefix: String,
}

#[cfg(target_arch = "wasm32")]
impl KvStore {
    /// Open the component's default store.
    pub fn open_default() -> CacheResult<Self> {
        let store = spin_sdk::key_value::Store::open_default()
            .map_err(|e| CacheError::Storage(e.to_string()))?;
        Ok(Self {
            store,
            prefix: "query".to_string(),
        })
    }

    /// Namespace keys under `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn storage_key(&self, key: &QueryKey) -> String {
        format!("{}:{}", self.prefix, key.as_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl QueryStore for KvStore {
    fn get(&self, key: &QueryKey) -> CacheResult<Option<CachedEntry>> {
        let bytes = self
            .store
            .get(self.storage_key(key))
            .map_err(|e| CacheError::Storage(e.to_string()))?;

        match bytes {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CacheError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &QueryKey, entry: CachedEntry) -> CacheResult<()> {
        let bytes =
            serde_json::to_vec(&entry).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.store
            .set(self.storage_key(key), &bytes)
            .map_err(|e| CacheError::Storage(e.to_string()))
    }

    fn remove(&self, key: &QueryKey) -> CacheResult<()> {
        self.store
            .delete(self.storage_key(key))
            .map_err(|e| CacheError::Storage(e.to_string()))
    }
}

/// Time source for staleness checks.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Cell<u64>,
}

impl ManualClock {
    /// Start at `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: Cell::new(now_ms),
        }
    }

    /// Move forward.
    pub fn advance(&self, by: Duration) {
        self.now_ms.set(self.now_ms.get() + by.as_millis() as u64);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_freshness_window() {
        let entry = CachedEntry::new("{}", 1_000);
        let window = Duration::from_secs(300);

        assert!(entry.is_fresh(1_000, window));
        assert!(entry.is_fresh(300_999, window));
        assert!(!entry.is_fresh(301_000, window));
        assert_eq!(entry.age_ms(4_000), 3_000);
    }

    #[test]
    fn test_memory_store_replaces_entries() {
        let store = MemoryStore::new();
        let key = QueryKey::new("product", "1");

        store.set(&key, CachedEntry::new("1", 0)).unwrap();
        store.set(&key, CachedEntry::new("2", 5)).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&key).unwrap().unwrap().data, "2");

        store.remove(&key).unwrap();
        assert!(store.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(10);
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now_ms(), 2_010);
    }
}
