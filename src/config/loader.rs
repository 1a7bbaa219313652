// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files.
//!
//! Handles loading configuration from JSON and YAML files.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::SdkConfig;

/// Config file names to search for (in order).
pub const CONFIG_FILES: &[&str] = &["observe.json", ".observe/config.json", "observe.config.yaml"];

/// Load configuration from a project root.
///
/// Searches for config files in the following order:
/// 1. observe.json
/// 2. .observe/config.json
/// 3. observe.config.yaml
pub fn load_workspace_config(root: &Path) -> Result<Option<SdkConfig>, ConfigError> {
    for filename in CONFIG_FILES {
        let path = root.join(filename);
        if path.exists() {
            tracing::debug!(path = %path.display(), "Loading config file");
            return load_config_file(&path).map(Some);
        }
    }
    Ok(None)
}

/// Load a configuration file (JSON or YAML).
pub fn load_config_file(path: &Path) -> Result<SdkConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(ConfigError::from),
        _ => serde_json::from_str(&content).map_err(ConfigError::from),
    }
}

/// Find the project root by searching for config files.
///
/// Walks up the directory tree from `start` until it finds a directory
/// containing a config file or reaches the filesystem root.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        for filename in CONFIG_FILES {
            if current.join(filename).exists() {
                return Some(current);
            }
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}
