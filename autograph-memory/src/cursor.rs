//! Opaque pagination cursors.

use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use autograph_data::Order;
use dashmap::DashMap;

/// Where a collection query stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPosition {
    pub table: String,
    pub order: Option<Order>,
    pub offset: usize,
}

/// Maps opaque cursor tokens to positions.
///
/// Implement this to keep cursors somewhere other than process memory.
pub trait CursorStore: Send + Sync + 'static {
    /// Stores `position` and returns the token that refers to it.
    fn issue(&self, position: CursorPosition) -> String;

    /// The position behind `token`, or `None` when it is unknown or expired.
    fn resolve(&self, token: &str) -> Option<CursorPosition>;
}

/// A thread-safe TTL map backed by `DashMap`.
///
/// Entries expire after `ttl` and are lazily evicted on access.
#[derive(Clone)]
pub struct TtlCache<K, V> {
    inner: Arc<DashMap<K, (V, Instant)>>,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        if let Some(entry) = self.inner.get(key) {
            let (value, inserted) = entry.value();
            if inserted.elapsed() < self.ttl {
                return Some(value.clone());
            }
            // Release the read guard before removing.
            drop(entry);
            self.inner.remove(key);
        }
        None
    }

    pub fn insert(&self, key: K, value: V) {
        self.inner.insert(key, (value, Instant::now()));
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn evict_expired(&self) {
        self.inner.retain(|_, (_, inserted)| inserted.elapsed() < self.ttl);
    }
}

/// In-process [`CursorStore`] handing out random `uuid` tokens.
#[derive(Clone)]
pub struct MemoryCursorStore {
    cache: TtlCache<String, CursorPosition>,
}

impl MemoryCursorStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: TtlCache::new(ttl),
        }
    }

    /// Number of cursors held, expired ones included until evicted.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for MemoryCursorStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

impl CursorStore for MemoryCursorStore {
    fn issue(&self, position: CursorPosition) -> String {
        self.cache.evict_expired();
        let token = uuid::Uuid::new_v4().to_string();
        self.cache.insert(token.clone(), position);
        token
    }

    fn resolve(&self, token: &str) -> Option<CursorPosition> {
        self.cache.get(&token.to_string())
    }
}
