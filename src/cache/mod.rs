//! In-memory TTL cache with an injected clock.
//!
//! Owned by the component that needs it and passed by reference; there is no
//! process-wide instance.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Source of "now" for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests and replays.
pub struct ManualClock {
    now: std::sync::RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::RwLock::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now += ChronoDuration::from_std(by).unwrap_or(ChronoDuration::MAX);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// Cached value and whether it is still within its TTL.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<V> {
    pub value: V,
    pub is_fresh: bool,
}

pub struct TtlCache<K, V> {
    ttl: ChronoDuration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::MAX),
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up `key`. Stale entries are still returned, flagged `is_fresh = false`.
    pub async fn get(&self, key: &K) -> Option<Cached<V>> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        let age = self.clock.now() - entry.stored_at;
        Some(Cached {
            value: entry.value.clone(),
            is_fresh: age < self.ttl,
        })
    }

    pub async fn put(&self, key: K, value: V, stored_at: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        entries.insert(key, Entry { value, stored_at });
    }

    /// Store with the cache clock's current time.
    pub async fn put_now(&self, key: K, value: V) {
        let now = self.clock.now();
        self.put(key, value, now).await;
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
