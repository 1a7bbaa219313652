// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.
//!
//! Handles merging configurations from different sources with proper precedence.

use std::time::Duration;

use super::types::{EnvOverrides, ResolvedConfig, SdkConfig};

/// Default configuration values.
pub fn default_config() -> ResolvedConfig {
    ResolvedConfig::default()
}

/// Merge configurations with precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment overrides (`OBSERVE_*`)
/// 2. File config (observe.json)
/// 3. Default values
pub fn merge_config(file: Option<SdkConfig>, env: EnvOverrides) -> ResolvedConfig {
    let mut result = default_config();

    if let Some(config) = file {
        apply_file_config(&mut result, &config);
    }

    apply_env_overrides(&mut result, &env);

    result
}

fn apply_file_config(result: &mut ResolvedConfig, config: &SdkConfig) {
    if config.app_name.is_some() {
        result.app_name = config.app_name.clone();
    }

    if let Some(enabled) = config.cache_enabled {
        result.cache_enabled = enabled;
    }

    if let Some(secs) = config.cache_ttl_secs {
        result.query_ttl = Duration::from_secs(secs);
    }

    if let Some(enabled) = config.tracing_enabled {
        result.tracing_enabled = enabled;
    }

    if config.log_level.is_some() {
        result.log_level = config.log_level.clone();
    }
}

fn apply_env_overrides(result: &mut ResolvedConfig, env: &EnvOverrides) {
    if env.app_name.is_some() {
        result.app_name = env.app_name.clone();
    }

    if let Some(enabled) = env.cache_enabled {
        result.cache_enabled = enabled;
    }

    if let Some(secs) = env.cache_ttl_secs {
        result.query_ttl = Duration::from_secs(secs);
    }

    if env.log_level.is_some() {
        result.log_level = env.log_level.clone();
    }
}
