// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Logging for the SDK itself.
//!
//! Everything the SDK reports about its own behaviour (masked fetch
//! failures, backend warnings, skipped instrumentations, failed flushes)
//! goes through `tracing`. Applications without a subscriber can install
//! one at startup:
//!
//! ```rust,ignore
//! use observe_sdk::telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::default())?;
//! ```
//!
//! The installed subscriber also carries [`crate::span::ContextLayer`], so
//! spans from [`crate::host::TracingTracer`] and from instrumented
//! dependencies are stamped with the observation context.

mod init;

pub use init::{init_telemetry, TelemetryConfig, TelemetryGuard};
