// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for the per-span hot paths: context merging, attribute
//! extraction and cache reads.
//!
//! Run with: `cargo bench --bench context`

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use observe_sdk::cache::{cache_key, ManualClock, MemoryCache};
use observe_sdk::context::{Identity, ObservationContext, PromptMetadata, PromptModel};

fn sample_context() -> ObservationContext {
    ObservationContext::new()
        .with_user(Identity::new("user-42").with_name("Ada"))
        .with_organization(Identity::new("org-7"))
        .with_feature_slug("support-bot")
        .with_metadata("channel", "web")
        .with_metadata("locale", "en-GB")
        .with_evaluators(["quality", "safety"])
        .with_prompt(
            PromptMetadata::new("welcome")
                .with_version("3")
                .with_model(PromptModel::new("openai", "gpt-4o")),
        )
}

/// Benchmark merging a nested fragment into an outer context.
fn bench_context_merge(c: &mut Criterion) {
    let outer = sample_context();
    let inner = ObservationContext::new()
        .with_evaluators(["toxicity", "quality"])
        .with_metadata("step", "retrieve")
        .with_prompt(PromptMetadata::new("welcome").with_version("4"));

    let mut group = c.benchmark_group("context_merge");
    group.throughput(Throughput::Elements(1));

    group.bench_function("merge_nested", |b| {
        b.iter(|| black_box(&outer).merge(black_box(&inner)));
    });

    group.bench_function("merge_empty", |b| {
        let empty = ObservationContext::new();
        b.iter(|| black_box(&outer).merge(black_box(&empty)));
    });

    group.finish();
}

/// Benchmark flattening a context into span attributes.
fn bench_attribute_extraction(c: &mut Criterion) {
    let full = sample_context();
    let empty = ObservationContext::new();

    let mut group = c.benchmark_group("attribute_extraction");

    group.bench_function("to_attributes_full", |b| {
        b.iter(|| black_box(&full).to_attributes());
    });

    group.bench_function("to_attributes_empty", |b| {
        b.iter(|| black_box(&empty).to_attributes());
    });

    group.finish();
}

/// Benchmark cache reads and key derivation.
fn bench_cache(c: &mut Criterion) {
    let cache: MemoryCache<String> = MemoryCache::with_clock(Arc::new(ManualClock::new(0)));
    for i in 0..1_000 {
        cache.set(format!("prompt:{}", i), "value".to_string(), Some(Duration::from_secs(300)));
    }

    let mut group = c.benchmark_group("cache");

    group.bench_function("get_hit", |b| {
        b.iter(|| cache.get(black_box("prompt:500")));
    });

    group.bench_function("get_miss", |b| {
        b.iter(|| cache.get(black_box("prompt:missing")));
    });

    group.bench_function("cache_key", |b| {
        b.iter(|| {
            cache_key(
                black_box("prompt"),
                black_box(&[("slug", Some("welcome")), ("version", Some("3")), ("tag", None)]),
            )
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_context_merge,
    bench_attribute_extraction,
    bench_cache,
);

criterion_main!(benches);
