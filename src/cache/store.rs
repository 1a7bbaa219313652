// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-memory key/value cache with per-entry TTL.
//!
//! Expiry is checked when an entry is read. Expired entries stay resident
//! until overwritten, [`MemoryCache::clear`]ed or removed by an explicit
//! [`MemoryCache::prune_expired`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_millis)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

struct CacheEntry<V> {
    value: V,
    /// `None` never expires.
    expire_at: Option<u64>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: u64) -> bool {
        self.expire_at.map(|at| now > at).unwrap_or(false)
    }
}

/// Thread-safe cache. Writes replace whole values; last write wins.
pub struct MemoryCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> MemoryCache<V> {
    /// Create a cache on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Get a value that has not expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now_millis();
        let entries = self.entries.read().ok()?;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    /// Store a value. `ttl` of `None` keeps it forever.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let expire_at = ttl.map(|ttl| {
            self.clock
                .now_millis()
                .saturating_add(ttl.as_millis() as u64)
        });
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.into(), CacheEntry { value, expire_at });
        }
    }

    /// Number of resident entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let now = self.clock.now_millis();
        match self.entries.write() {
            Ok(mut entries) => {
                let before = entries.len();
                entries.retain(|_, entry| !entry.is_expired(now));
                before - entries.len()
            }
            Err(_) => 0,
        }
    }
}

impl<V: Clone> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
