// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Counters for cache outcomes.

use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome counters for one fetch policy. Lock-free.
#[derive(Debug, Default)]
pub struct CacheStats {
    query_hits: AtomicU64,
    fallback_hits: AtomicU64,
    misses: AtomicU64,
    live_failures: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_query_hit(&self) {
        self.query_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fallback_hit(&self) {
        self.fallback_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_live_failure(&self) {
        self.live_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of all counters.
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            query_hits: self.query_hits.load(Ordering::Relaxed),
            fallback_hits: self.fallback_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            live_failures: self.live_failures.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.query_hits.store(0, Ordering::Relaxed);
        self.fallback_hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.live_failures.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    /// Reads served from the short-TTL cache.
    pub query_hits: u64,
    /// Failed live fetches masked by the fallback cache.
    pub fallback_hits: u64,
    /// Reads that returned the live value or the live error.
    pub misses: u64,
    /// Live fetches that failed, masked or not.
    pub live_failures: u64,
}

impl CacheStatsSnapshot {
    /// Fraction of reads served without a fresh live value.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.query_hits + self.fallback_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}
