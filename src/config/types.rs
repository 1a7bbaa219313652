// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! Defines the file configuration, environment overrides and the resolved
//! configuration the client is built from.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::span::SdkInfo;

/// File configuration.
/// Can be defined in observe.json, .observe/config.json or observe.config.yaml.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkConfig {
    /// Application name stamped on every SDK span
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// Whether resource reads use the query and fallback caches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_enabled: Option<bool>,

    /// Lifetime of query cache entries, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,

    /// Whether spans are started at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracing_enabled: Option<bool>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Overrides read from `OBSERVE_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub app_name: Option<String>,
    pub cache_enabled: Option<bool>,
    pub cache_ttl_secs: Option<u64>,
    pub log_level: Option<String>,
}

pub const ENV_APP_NAME: &str = "OBSERVE_APP_NAME";
pub const ENV_CACHE_ENABLED: &str = "OBSERVE_CACHE_ENABLED";
pub const ENV_CACHE_TTL_SECS: &str = "OBSERVE_CACHE_TTL_SECS";
pub const ENV_LOG_LEVEL: &str = "OBSERVE_LOG_LEVEL";

impl EnvOverrides {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Read overrides from `(name, value)` pairs. Unknown names are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut overrides = Self::default();
        for (name, value) in vars {
            let value: String = value.into();
            match name.as_ref() {
                ENV_APP_NAME => overrides.app_name = Some(value),
                ENV_CACHE_ENABLED => overrides.cache_enabled = Some(parse_bool(ENV_CACHE_ENABLED, &value)?),
                ENV_CACHE_TTL_SECS => {
                    let secs = value.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                        field: ENV_CACHE_TTL_SECS.to_string(),
                        message: e.to_string(),
                    })?;
                    overrides.cache_ttl_secs = Some(secs);
                }
                ENV_LOG_LEVEL => overrides.log_level = Some(value),
                _ => {}
            }
        }
        Ok(overrides)
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("expected a boolean, got \"{}\"", other),
        }),
    }
}

/// Fully resolved configuration with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub app_name: Option<String>,
    pub cache_enabled: bool,
    pub query_ttl: Duration,
    pub tracing_enabled: bool,
    pub log_level: Option<String>,
    pub sdk_name: String,
    pub sdk_version: String,
    pub sdk_target: String,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let sdk = SdkInfo::default();
        Self {
            app_name: None,
            cache_enabled: true,
            query_ttl: crate::cache::DEFAULT_QUERY_TTL,
            tracing_enabled: true,
            log_level: None,
            sdk_name: sdk.name,
            sdk_version: sdk.version,
            sdk_target: sdk.target,
        }
    }
}

impl ResolvedConfig {
    /// Check values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query_ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "cacheTtlSecs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if let Some(level) = &self.log_level {
            if level.parse::<tracing::Level>().is_err() {
                return Err(ConfigError::InvalidValue {
                    field: "logLevel".to_string(),
                    message: format!("unknown level \"{}\"", level),
                });
            }
        }

        Ok(())
    }

    /// SDK identification stamped on spans.
    pub fn sdk_info(&self) -> SdkInfo {
        SdkInfo {
            name: self.sdk_name.clone(),
            version: self.sdk_version.clone(),
            target: self.sdk_target.clone(),
            app_name: self.app_name.clone(),
        }
    }
}
