// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Span attribute values and the stable attribute namespace.
//!
//! Every attribute the SDK writes onto a span goes through [`AttributeValue`].
//! Arbitrary JSON is narrowed with [`sanitize`]: primitives and arrays of a
//! single primitive type pass through, everything else is stored as a JSON
//! string.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Flat, deterministically ordered attribute map.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Replacement emitted when a value cannot be serialized to JSON.
pub const UNSERIALIZABLE_SENTINEL: &str = "[unserializable]";

/// Stable attribute keys other systems may query on spans.
pub mod keys {
    pub const TRACE: &str = "observe.trace";
    pub const IN_TRACE: &str = "observe.in_trace";
    pub const SPAN_KIND: &str = "observe.span_kind";
    pub const SPAN_TYPE: &str = "observe.span_type";

    pub const SDK_NAME: &str = "observe.sdk.name";
    pub const SDK_VERSION: &str = "observe.sdk.version";
    pub const SDK_TARGET: &str = "observe.sdk.target";
    pub const APP_NAME: &str = "observe.app.name";

    pub const USER_ID: &str = "observe.user.id";
    pub const USER_NAME: &str = "observe.user.name";
    pub const ORGANIZATION_ID: &str = "observe.organization.id";
    pub const ORGANIZATION_NAME: &str = "observe.organization.name";

    pub const FEATURE_SLUG: &str = "observe.feature_slug";
    pub const EXPERIMENT_ID: &str = "observe.experiment.id";
    pub const EXPERIMENT_NAME: &str = "observe.experiment.name";
    pub const EXPERIMENT_FEATURE_SLUG: &str = "observe.experiment.feature_slug";

    pub const CACHE_HIT: &str = "observe.cache.hit";
    pub const CACHE_TYPE: &str = "observe.cache.type";

    pub const PROMPT_SLUG: &str = "observe.prompt.slug";
    pub const PROMPT_VERSION: &str = "observe.prompt.version";
    pub const PROMPT_TAG: &str = "observe.prompt.tag";
    pub const PROMPT_MODEL_PROVIDER: &str = "observe.prompt.model.provider";
    pub const PROMPT_MODEL_NAME: &str = "observe.prompt.model.model";
    pub const PROMPT_FROM_CACHE: &str = "observe.prompt.from_cache";
    pub const PROMPT_VARIABLES: &str = "observe.prompt.variables";
    pub const PROMPTS_COUNT: &str = "observe.prompts.count";

    pub const DATASET_SLUG: &str = "observe.dataset.slug";
    pub const DATASET_ROWS: &str = "observe.dataset.rows";
    pub const DATASET_COUNT: &str = "observe.dataset.count";

    /// Prefix for flattened metadata; keys become `observe.meta.<key>`.
    pub const METADATA_PREFIX: &str = "observe.meta";

    pub const EVALUATORS: &str = "observe.evaluators";
    pub const EVALUATION_SAMPLE_RATE: &str = "observe.evaluation.sample_rate";
}

/// A value that can be stored on a span.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    BoolArray(Vec<bool>),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
    StringArray(Vec<String>),
}

impl AttributeValue {
    /// Get the string payload, if this is a string attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the boolean payload, if this is a boolean attribute.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the numeric payload as `f64`, for int or float attributes.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the integer payload, if this is an integer attribute.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
            Self::BoolArray(v) => write!(f, "{:?}", v),
            Self::IntArray(v) => write!(f, "{:?}", v),
            Self::FloatArray(v) => write!(f, "{:?}", v),
            Self::StringArray(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<usize> for AttributeValue {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(v: Vec<String>) -> Self {
        Self::StringArray(v)
    }
}

/// Narrow an arbitrary JSON value to something a span can hold.
///
/// Returns `None` for `null`, which is dropped rather than stored.
pub fn sanitize(value: Value) -> Option<AttributeValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(AttributeValue::Bool(b)),
        Value::Number(n) => Some(number_attribute(&n)),
        Value::String(s) => Some(AttributeValue::String(s)),
        Value::Array(items) => Some(sanitize_array(items)),
        Value::Object(_) => Some(AttributeValue::String(value.to_string())),
    }
}

/// Serialize `value` to JSON and sanitize it; drops it if serialization fails.
pub fn sanitize_serializable<T: Serialize + ?Sized>(value: &T) -> Option<AttributeValue> {
    match serde_json::to_value(value) {
        Ok(json) => sanitize(json),
        Err(e) => {
            tracing::debug!("Dropping attribute that failed to serialize: {}", e);
            None
        }
    }
}

/// Serialize `value` to a JSON string, or return [`UNSERIALIZABLE_SENTINEL`].
pub fn serialize_or_sentinel<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| UNSERIALIZABLE_SENTINEL.to_string())
}

fn number_attribute(n: &serde_json::Number) -> AttributeValue {
    match n.as_i64() {
        Some(i) => AttributeValue::Int(i),
        None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

fn sanitize_array(items: Vec<Value>) -> AttributeValue {
    if !items.is_empty() {
        if items.iter().all(Value::is_string) {
            return AttributeValue::StringArray(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            );
        }
        if items.iter().all(Value::is_boolean) {
            return AttributeValue::BoolArray(items.iter().filter_map(Value::as_bool).collect());
        }
        if items.iter().all(|v| v.is_i64()) {
            return AttributeValue::IntArray(items.iter().filter_map(Value::as_i64).collect());
        }
        if items.iter().all(Value::is_number) {
            return AttributeValue::FloatArray(items.iter().filter_map(Value::as_f64).collect());
        }
    }
    AttributeValue::String(Value::Array(items).to_string())
}
