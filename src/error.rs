// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the SDK.
//!
//! Strongly-typed errors per concern, defined with `thiserror`; `anyhow` is
//! available for application-level propagation.

use thiserror::Error;

/// Errors surfaced by resource operations (prompts, datasets, traces).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SdkError {
    #[error("API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Response decoding error: {0}")]
    Decode(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl SdkError {
    /// Create an API error with status code.
    pub fn api(message: impl Into<String>, status_code: u16) -> Self {
        Self::Api {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create an API error without status code.
    pub fn api_message(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status_code: None,
        }
    }

    /// HTTP-like status code, when the transport reported one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => *status_code,
            Self::Unauthorized(_) => Some(401),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api {
                status_code: Some(code),
                ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Errors raised while installing optional instrumentations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstrumentationError {
    #[error("Optional dependency missing for {instrumentation}: {dependency}")]
    MissingDependency {
        instrumentation: String,
        dependency: String,
    },

    #[error("Failed to install {instrumentation}: {message}")]
    InstallFailed {
        instrumentation: String,
        message: String,
    },
}

impl InstrumentationError {
    pub fn missing(instrumentation: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self::MissingDependency {
            instrumentation: instrumentation.into(),
            dependency: dependency.into(),
        }
    }

    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, Self::MissingDependency { .. })
    }
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdk_error_retryable() {
        assert!(SdkError::Network("reset".to_string()).is_retryable());
        assert!(SdkError::Timeout(30000).is_retryable());
        assert!(SdkError::api("overloaded", 503).is_retryable());
        assert!(SdkError::api("slow down", 429).is_retryable());
        assert!(!SdkError::api("bad request", 400).is_retryable());
        assert!(!SdkError::NotFound("prompt".to_string()).is_retryable());
    }

    #[test]
    fn test_sdk_error_status_code() {
        assert_eq!(SdkError::api("Bad request", 400).status_code(), Some(400));
        assert_eq!(SdkError::api_message("odd").status_code(), None);
        assert_eq!(SdkError::NotFound("x".into()).status_code(), Some(404));
    }

    #[test]
    fn test_sdk_error_from_json() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: SdkError = result.unwrap_err().into();
        assert!(matches!(err, SdkError::Decode(_)));
    }

    #[test]
    fn test_config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ConfigError = io_err.into();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_error_display() {
        let err = SdkError::api("prompt not published", 422);
        assert_eq!(err.to_string(), "API error: prompt not published");

        let err = InstrumentationError::missing("openai", "async-openai");
        assert!(err.to_string().contains("async-openai"));
        assert!(err.is_missing_dependency());
    }
}
