// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for the SDK.
//!
//! Handles loading, merging, and validation of configuration from:
//! - Config file: observe.json, .observe/config.json or observe.config.yaml
//! - Environment: `OBSERVE_APP_NAME`, `OBSERVE_CACHE_ENABLED`,
//!   `OBSERVE_CACHE_TTL_SECS`, `OBSERVE_LOG_LEVEL`
//!
//! Configuration is merged with precedence (environment > file > defaults).

mod loader;
mod merger;
mod types;

// Re-export public types
pub use loader::{find_workspace_root, load_config_file, load_workspace_config, CONFIG_FILES};

pub use merger::{default_config, merge_config};

pub use types::{
    EnvOverrides, ResolvedConfig, SdkConfig, ENV_APP_NAME, ENV_CACHE_ENABLED, ENV_CACHE_TTL_SECS,
    ENV_LOG_LEVEL,
};

use crate::error::ConfigError;
use std::path::Path;

/// Load, merge and validate all configuration sources for a project root.
///
/// This is the main entry point for configuration loading.
pub fn load_config(root: &Path) -> Result<ResolvedConfig, ConfigError> {
    load_config_with(root, EnvOverrides::from_env()?)
}

/// Like [`load_config`], with explicit environment overrides.
pub fn load_config_with(root: &Path, env: EnvOverrides) -> Result<ResolvedConfig, ConfigError> {
    let file = load_workspace_config(root)?;
    let config = merge_config(file, env);
    config.validate()?;
    Ok(config)
}
