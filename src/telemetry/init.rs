// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Subscriber installation for applications without one of their own.

use std::io;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ResolvedConfig;
use crate::span::ContextLayer;

/// Crate target the SDK log level applies to.
const SDK_TARGET: &str = "observe_sdk";

/// How [`init_telemetry`] sets up the subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Level for every crate other than this one.
    pub app_level: Level,

    /// Level for this crate's own events; `app_level` when unset.
    pub sdk_level: Option<Level>,

    /// Stamp the observation context onto `tracing` spans.
    pub stamp_spans: bool,

    pub ansi_colors: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            app_level: Level::INFO,
            sdk_level: None,
            stamp_spans: true,
            ansi_colors: true,
        }
    }
}

impl TelemetryConfig {
    /// Take the SDK level from a resolved configuration.
    ///
    /// An unparseable level is ignored with a warning; `validate` rejects it
    /// before a client is built.
    pub fn for_config(config: &ResolvedConfig) -> Self {
        let sdk_level = config.log_level.as_deref().and_then(|level| {
            level
                .parse::<Level>()
                .map_err(|_| tracing::warn!("Ignoring unknown log level {:?}", level))
                .ok()
        });
        Self {
            sdk_level,
            ..Default::default()
        }
    }

    /// Filter directive used when `RUST_LOG` is not set.
    pub fn directive(&self) -> String {
        match self.sdk_level {
            Some(level) => format!("{},{}={}", self.app_level, SDK_TARGET, level),
            None => self.app_level.to_string(),
        }
    }
}

/// Returned by [`init_telemetry`]; keep it alive for the program's lifetime.
#[must_use]
pub struct TelemetryGuard {
    _private: (),
}

/// Install a global fmt subscriber, with [`ContextLayer`] unless disabled.
///
/// `RUST_LOG` takes precedence over the configured levels. Fails if a global
/// subscriber is already set.
///
/// ```rust,ignore
/// let config = observe_sdk::config::load_config(std::path::Path::new("."))?;
/// let _guard = init_telemetry(&TelemetryConfig::for_config(&config))?;
/// ```
pub fn init_telemetry(config: &TelemetryConfig) -> io::Result<TelemetryGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directive()));
    let stamper = config.stamp_spans.then(ContextLayer::new);

    tracing_subscriber::registry()
        .with(filter)
        .with(stamper)
        .with(fmt::layer().with_ansi(config.ansi_colors).compact())
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(TelemetryGuard { _private: () })
}
