// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Caching for resource reads.
//!
//! - [`MemoryCache`] - TTL key/value store with lazy expiry
//! - [`ResilientFetch`] - query cache + live fetch + fallback cache policy
//! - [`cache_key`] - deterministic keys from a request's identifying fields
//!
//! Both caches are process memory only.

mod fetch;
mod stats;
mod store;

pub use fetch::{
    CacheSource, FallbackGating, FetchPolicy, FetchResponse, Fetched, ResilientFetch,
    DEFAULT_QUERY_TTL,
};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::{Clock, ManualClock, MemoryCache, SystemClock};

use sha2::{Digest, Sha256};

/// Build a cache key for a resource request.
///
/// `fields` are the request's identifying fields in a fixed order; absent
/// fields still take part so `(slug, None, tag)` and `(slug, tag, None)`
/// never collide.
pub fn cache_key(kind: &str, fields: &[(&str, Option<&str>)]) -> String {
    let mut hasher = Sha256::new();
    for (name, value) in fields {
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        match value {
            Some(v) => {
                hasher.update(b"s:");
                hasher.update(v.as_bytes());
            }
            None => hasher.update(b"n"),
        }
        hasher.update(b"\x1f");
    }
    let hash = format!("{:x}", hasher.finalize());
    format!("{}:{}", kind, &hash[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_deterministic() {
        let a = cache_key("prompt", &[("slug", Some("welcome")), ("version", Some("2"))]);
        let b = cache_key("prompt", &[("slug", Some("welcome")), ("version", Some("2"))]);
        assert_eq!(a, b);
        assert!(a.starts_with("prompt:"));
    }

    #[test]
    fn test_cache_key_distinguishes_fields() {
        let version = cache_key("prompt", &[("slug", Some("p")), ("version", Some("x")), ("tag", None)]);
        let tag = cache_key("prompt", &[("slug", Some("p")), ("version", None), ("tag", Some("x"))]);
        assert_ne!(version, tag);

        let other_kind = cache_key("dataset", &[("slug", Some("p"))]);
        assert_ne!(other_kind, cache_key("prompt", &[("slug", Some("p"))]));
    }
}
