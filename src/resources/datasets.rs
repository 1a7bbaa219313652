// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Dataset retrieval.
//!
//! Like prompts, reads go through the query cache, the live API and the
//! fallback cache. Unlike prompts, the fallback is consulted on every live
//! failure, whatever the call's cache flag says.

use std::sync::Arc;
use std::time::Duration;

use crate::attributes::keys;
use crate::cache::{
    cache_key, CacheStatsSnapshot, Clock, FallbackGating, FetchPolicy, Fetched, ResilientFetch,
    SystemClock, DEFAULT_QUERY_TTL,
};
use crate::error::SdkError;
use crate::span::{Observer, ScopedOptions};

use super::api::{Dataset, DatasetApi, DatasetSummary};

/// Tracer name for dataset spans.
pub const DATASETS_TRACER: &str = "observe-sdk.datasets";

/// Dataset client.
pub struct Datasets {
    api: Arc<dyn DatasetApi>,
    observer: Observer,
    fetch: ResilientFetch<Dataset>,
    cache_by_default: bool,
}

impl Datasets {
    pub fn new(api: Arc<dyn DatasetApi>, observer: Observer) -> Self {
        Self {
            api,
            observer,
            fetch: ResilientFetch::new(Self::policy(DEFAULT_QUERY_TTL)),
            cache_by_default: true,
        }
    }

    fn policy(query_ttl: Duration) -> FetchPolicy {
        FetchPolicy::new(FallbackGating::Always).with_query_ttl(query_ttl)
    }

    /// Replace the caches. Anything cached so far is dropped.
    pub fn with_cache(mut self, query_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        self.fetch = ResilientFetch::with_clock(Self::policy(query_ttl), clock);
        self
    }

    pub fn with_query_ttl(self, query_ttl: Duration) -> Self {
        self.with_cache(query_ttl, Arc::new(SystemClock))
    }

    /// Whether [`Datasets::get`] uses the query cache.
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_by_default = enabled;
        self
    }

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.fetch.stats()
    }

    /// Fetch a dataset using the default cache setting.
    pub async fn get(&self, slug: &str) -> Result<Dataset, SdkError> {
        self.get_with(slug, self.cache_by_default).await.map(|fetched| fetched.value)
    }

    /// Fetch a dataset, reporting which cache tier answered.
    pub async fn get_with(&self, slug: &str, cache: bool) -> Result<Fetched<Dataset>, SdkError> {
        if slug.trim().is_empty() {
            return Err(SdkError::InvalidArgument(
                "dataset slug must not be empty".to_string(),
            ));
        }

        let key = cache_key("dataset", &[("slug", Some(slug))]);
        let options = ScopedOptions::new()
            .kind("dataset")
            .attribute(keys::DATASET_SLUG, slug);

        self.observer
            .scoped(DATASETS_TRACER, "datasets.get", options, |span| async move {
                let fetched = self
                    .fetch
                    .get(&key, cache, &span, || self.api.fetch_dataset(slug.to_string()))
                    .await?;
                span.set_attribute(keys::DATASET_ROWS, fetched.value.len());
                Ok::<_, SdkError>(fetched)
            })
            .await
    }

    /// List available datasets. Never cached.
    pub async fn list(&self) -> Result<Vec<DatasetSummary>, SdkError> {
        self.observer
            .scoped(
                DATASETS_TRACER,
                "datasets.list",
                ScopedOptions::new().kind("dataset"),
                |span| async move {
                    let datasets = self.api.list_datasets().await?;
                    span.set_attribute(keys::DATASET_COUNT, datasets.len());
                    Ok::<_, SdkError>(datasets)
                },
            )
            .await
    }
}
