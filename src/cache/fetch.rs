// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Two-tier cached reads that fall back to stale data when the live fetch
//! fails.
//!
//! A read goes through:
//!
//! 1. the short-TTL query cache (when caching is enabled) - a hit returns
//!    without a live fetch
//! 2. the live fetch - success refreshes both caches
//! 3. on live failure, the never-expiring fallback cache - a hit is returned
//!    as a success and the failure is only logged
//!
//! The enclosing span records which tier answered in `cache.hit` and
//! `cache.type`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::attributes::keys;
use crate::span::SpanHandle;

use super::stats::{CacheStats, CacheStatsSnapshot};
use super::store::{Clock, MemoryCache, SystemClock};

/// Default lifetime of query cache entries.
pub const DEFAULT_QUERY_TTL: Duration = Duration::from_secs(5 * 60);

/// Whether the fallback lookup honours the caller's cache flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackGating {
    /// Fallback is consulted only when caching is enabled for the call.
    CacheFlag,
    /// Fallback is consulted on every live failure.
    Always,
}

impl FallbackGating {
    fn allows(self, cache_enabled: bool) -> bool {
        match self {
            Self::CacheFlag => cache_enabled,
            Self::Always => true,
        }
    }
}

/// Which tier produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Live,
    Query,
    Fallback,
}

impl CacheSource {
    /// Value recorded as `cache.type`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "none",
            Self::Query => "query",
            Self::Fallback => "fallback",
        }
    }

    pub fn is_cached(self) -> bool {
        !matches!(self, Self::Live)
    }
}

impl fmt::Display for CacheSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful live response.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse<V> {
    pub value: V,
    /// Non-fatal message from the backend; logged, never an error.
    pub warning: Option<String>,
}

impl<V> FetchResponse<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

/// A value together with the tier that served it.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<V> {
    pub value: V,
    pub source: CacheSource,
}

/// Cache configuration for one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub query_ttl: Duration,
    pub gating: FallbackGating,
}

impl FetchPolicy {
    pub fn new(gating: FallbackGating) -> Self {
        Self {
            query_ttl: DEFAULT_QUERY_TTL,
            gating,
        }
    }

    pub fn with_query_ttl(mut self, query_ttl: Duration) -> Self {
        self.query_ttl = query_ttl;
        self
    }
}

/// Query and fallback caches for one resource kind.
pub struct ResilientFetch<V> {
    query: MemoryCache<V>,
    fallback: MemoryCache<V>,
    policy: FetchPolicy,
    stats: CacheStats,
}

impl<V: Clone> ResilientFetch<V> {
    pub fn new(policy: FetchPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: FetchPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            query: MemoryCache::with_clock(Arc::clone(&clock)),
            fallback: MemoryCache::with_clock(clock),
            policy,
            stats: CacheStats::new(),
        }
    }

    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn query_cache(&self) -> &MemoryCache<V> {
        &self.query
    }

    pub fn fallback_cache(&self) -> &MemoryCache<V> {
        &self.fallback
    }

    /// Read `key`, calling `fetch` only when the query cache cannot answer.
    ///
    /// Errors from `fetch` are returned unchanged unless the fallback cache
    /// holds a value for `key` and the policy allows consulting it.
    pub async fn get<E, F, Fut>(
        &self,
        key: &str,
        cache_enabled: bool,
        span: &SpanHandle,
        fetch: F,
    ) -> Result<Fetched<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<FetchResponse<V>, E>>,
        E: fmt::Display,
    {
        if cache_enabled {
            if let Some(value) = self.query.get(key) {
                self.stats.record_query_hit();
                annotate(span, CacheSource::Query);
                return Ok(Fetched {
                    value,
                    source: CacheSource::Query,
                });
            }
        }

        match fetch().await {
            Ok(response) => {
                self.query
                    .set(key, response.value.clone(), Some(self.policy.query_ttl));
                self.fallback.set(key, response.value.clone(), None);

                if let Some(warning) = &response.warning {
                    tracing::warn!(key, "{}", warning);
                }

                self.stats.record_miss();
                annotate(span, CacheSource::Live);
                Ok(Fetched {
                    value: response.value,
                    source: CacheSource::Live,
                })
            }
            Err(err) => {
                self.stats.record_live_failure();

                let stale = if self.policy.gating.allows(cache_enabled) {
                    self.fallback.get(key)
                } else {
                    None
                };

                match stale {
                    Some(value) => {
                        tracing::warn!(
                            key,
                            "Live fetch failed, serving fallback cache: {}",
                            err
                        );
                        self.stats.record_fallback_hit();
                        annotate(span, CacheSource::Fallback);
                        Ok(Fetched {
                            value,
                            source: CacheSource::Fallback,
                        })
                    }
                    None => {
                        self.stats.record_miss();
                        annotate(span, CacheSource::Live);
                        Err(err)
                    }
                }
            }
        }
    }
}

fn annotate(span: &SpanHandle, source: CacheSource) {
    span.set_attribute(keys::CACHE_HIT, source.is_cached());
    span.set_attribute(keys::CACHE_TYPE, source.as_str());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::host::{HostTracer, InMemoryTracer, SpanOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn setup(gating: FallbackGating) -> (ResilientFetch<String>, ManualClock) {
        let clock = ManualClock::new(0);
        let fetch = ResilientFetch::with_clock(FetchPolicy::new(gating), Arc::new(clock.clone()));
        (fetch, clock)
    }

    async fn ok(value: &str) -> Result<FetchResponse<String>, String> {
        Ok(FetchResponse::new(value.to_string()))
    }

    async fn fail() -> Result<FetchResponse<String>, String> {
        Err("503 service unavailable".to_string())
    }

    #[tokio::test]
    async fn test_live_then_query_hit() {
        let (fetch, _clock) = setup(FallbackGating::CacheFlag);
        let span = SpanHandle::noop();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let result = fetch
                .get("k", true, &span, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    ok("v1")
                })
                .await
                .unwrap();
            assert_eq!(result.value, "v1");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = fetch.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.query_hits, 1);
    }

    #[tokio::test]
    async fn test_cache_disabled_always_fetches() {
        let (fetch, _clock) = setup(FallbackGating::CacheFlag);
        let span = SpanHandle::noop();

        fetch.get("k", false, &span, || ok("v1")).await.unwrap();
        let second = fetch.get("k", false, &span, || ok("v2")).await.unwrap();

        assert_eq!(second.value, "v2");
        assert_eq!(second.source, CacheSource::Live);
    }

    #[tokio::test]
    async fn test_query_expiry_triggers_refetch() {
        let (fetch, clock) = setup(FallbackGating::CacheFlag);
        let span = SpanHandle::noop();

        fetch.get("k", true, &span, || ok("old")).await.unwrap();
        clock.advance(DEFAULT_QUERY_TTL + Duration::from_millis(1));
        let result = fetch.get("k", true, &span, || ok("new")).await.unwrap();

        assert_eq!(result.value, "new");
        assert_eq!(result.source, CacheSource::Live);
    }

    #[tokio::test]
    async fn test_failure_masked_by_fallback() {
        let (fetch, clock) = setup(FallbackGating::Always);
        let span = SpanHandle::noop();

        fetch.get("k", true, &span, || ok("stale")).await.unwrap();
        clock.advance(DEFAULT_QUERY_TTL * 10);

        let result = fetch.get("k", true, &span, fail).await.unwrap();
        assert_eq!(result.value, "stale");
        assert_eq!(result.source, CacheSource::Fallback);
        assert_eq!(fetch.stats().fallback_hits, 1);
    }

    #[tokio::test]
    async fn test_failure_without_fallback_propagates() {
        let (fetch, _clock) = setup(FallbackGating::Always);
        let span = SpanHandle::noop();

        let err = fetch.get("k", true, &span, fail).await.unwrap_err();
        assert_eq!(err, "503 service unavailable");
        assert_eq!(fetch.stats().live_failures, 1);
    }

    #[tokio::test]
    async fn test_cache_flag_gating_blocks_fallback() {
        let (fetch, _clock) = setup(FallbackGating::CacheFlag);
        let span = SpanHandle::noop();

        fetch.get("k", true, &span, || ok("stale")).await.unwrap();
        let err = fetch.get("k", false, &span, fail).await.unwrap_err();
        assert_eq!(err, "503 service unavailable");
    }

    #[tokio::test]
    async fn test_always_gating_ignores_cache_flag() {
        let (fetch, _clock) = setup(FallbackGating::Always);
        let span = SpanHandle::noop();

        fetch.get("k", false, &span, || ok("stale")).await.unwrap();
        let result = fetch.get("k", false, &span, fail).await.unwrap();
        assert_eq!(result.value, "stale");
    }

    #[tokio::test]
    async fn test_success_overwrites_fallback() {
        let (fetch, _clock) = setup(FallbackGating::Always);
        let span = SpanHandle::noop();

        fetch.get("k", false, &span, || ok("v1")).await.unwrap();
        fetch.get("k", false, &span, || ok("v2")).await.unwrap();
        assert_eq!(fetch.fallback_cache().get("k").as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_warning_is_still_success() {
        let (fetch, _clock) = setup(FallbackGating::CacheFlag);
        let span = SpanHandle::noop();

        let result = fetch
            .get("k", true, &span, || async {
                Ok::<_, String>(FetchResponse::new("v".to_string()).with_warning("deprecated version"))
            })
            .await
            .unwrap();
        assert_eq!(result.value, "v");
    }

    #[tokio::test]
    async fn test_span_annotations() {
        let tracer = InMemoryTracer::new();
        let (fetch, _clock) = setup(FallbackGating::Always);

        let miss = SpanHandle::new(tracer.start_span("miss", SpanOptions::new("t")));
        fetch.get("k", true, &miss, || ok("v")).await.unwrap();
        miss.end();

        let hit = SpanHandle::new(tracer.start_span("hit", SpanOptions::new("t")));
        fetch.get("k", true, &hit, || ok("v")).await.unwrap();
        hit.end();

        let fallback = SpanHandle::new(tracer.start_span("fallback", SpanOptions::new("t")));
        fetch.get("k", false, &fallback, fail).await.unwrap();
        fallback.end();

        let expect = [("miss", false, "none"), ("hit", true, "query"), ("fallback", true, "fallback")];
        for (name, hit, kind) in expect {
            let span = tracer.span_named(name).unwrap();
            assert_eq!(span.attribute(keys::CACHE_HIT).and_then(|v| v.as_bool()), Some(hit));
            assert_eq!(span.str_attribute(keys::CACHE_TYPE), Some(kind));
        }
    }
}
