// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Observe SDK - client-side instrumentation for AI applications.
//!
//! Attaches *who* and *what* an operation is for (identity, feature,
//! experiment, evaluators, prompts in use) to every span started while it
//! runs, and reads prompts and datasets from the platform with caches that
//! keep serving when the platform is unreachable.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`context`] - Ambient observation context, scoped per task
//! - [`span`] - Span handles, the [`Observer`], the context stamper and its `tracing` layer
//! - [`host`] - Contract with the host tracing substrate, plus `tracing`, no-op and in-memory tracers
//! - [`attributes`] - Attribute keys and value sanitization
//! - [`cache`] - TTL caches and the resilient two-tier fetch policy
//! - [`resources`] - Prompt and dataset clients
//! - [`monitor`] - Traces and their single-flight flush
//! - [`instrumentation`] - Registry of optional third-party instrumentations
//! - [`config`] - Configuration loading and merging
//! - [`telemetry`] - Subscriber setup for the SDK's logs and stamped spans
//! - [`error`] - Error types and result aliases
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use observe_sdk::context::{self, Identity, ObservationContext};
//! use observe_sdk::host::TracingTracer;
//! use observe_sdk::resources::GetPrompt;
//! use observe_sdk::span::ObserveOptions;
//! use observe_sdk::Client;
//!
//! let client = Client::builder()
//!     .tracer(Arc::new(TracingTracer::new()))
//!     .prompt_api(api)
//!     .build()?;
//!
//! client
//!     .observer()
//!     .observe(ObserveOptions::new("support-bot", "answer"), |root| async move {
//!         root.set_identity(Some(Identity::new("user-1")), None);
//!         let prompt = client.prompts().get(GetPrompt::new("welcome")).await?;
//!         context::with_merged_context(prompt.context(), call_model(&prompt)).await
//!     })
//!     .await?;
//! ```

pub mod attributes;
pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod instrumentation;
pub mod monitor;
pub mod resources;
pub mod span;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use client::{Client, ClientBuilder};
pub use context::{Identity, ObservationContext, PromptMetadata};
pub use error::{ConfigError, InstrumentationError, Result, SdkError};
pub use span::{ObserveOptions, Observer, ScopedOptions, SpanHandle, StartSpanHandle};

/// Version of the SDK.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
