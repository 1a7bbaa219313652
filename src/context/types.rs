// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Observation context value types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder used when a prompt carries no model information.
pub const UNKNOWN_MODEL: &str = "unknown";

/// A user or organization record. Merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Any other fields supplied by the caller.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Evaluation settings attached to an observed operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,
}

impl EvaluationConfig {
    pub fn with_sample_rate(sample_rate: f64) -> Self {
        Self {
            sample_rate: Some(sample_rate),
        }
    }

    /// Sample rate clamped to `[0, 1]`, or `None` if unset or NaN.
    pub fn clamped_sample_rate(&self) -> Option<f64> {
        self.sample_rate
            .filter(|rate| !rate.is_nan())
            .map(|rate| rate.clamp(0.0, 1.0))
    }
}

/// Model a prompt is configured for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptModel {
    pub provider: String,
    pub model: String,
}

impl PromptModel {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

impl Default for PromptModel {
    fn default() -> Self {
        Self::new(UNKNOWN_MODEL, UNKNOWN_MODEL)
    }
}

/// Description of a prompt in use by the current operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptMetadata {
    pub slug: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,

    #[serde(default)]
    pub model: PromptModel,

    #[serde(default)]
    pub from_cache: bool,
}

impl PromptMetadata {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_model(mut self, model: PromptModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn with_from_cache(mut self, from_cache: bool) -> Self {
        self.from_cache = from_cache;
        self
    }

    /// Trimmed slug, or `None` if the slug is blank.
    pub fn valid_slug(&self) -> Option<&str> {
        let slug = self.slug.trim();
        (!slug.is_empty()).then_some(slug)
    }

    pub fn is_valid(&self) -> bool {
        self.valid_slug().is_some()
    }
}

/// Business-level context carried through an observed call chain.
///
/// Values are immutable once installed in a scope; nested scopes build a new
/// value with [`ObservationContext::merge`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<Identity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_slug: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluators: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_config: Option<EvaluationConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Vec<PromptMetadata>>,
}

impl ObservationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: Identity) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_organization(mut self, organization: Identity) -> Self {
        self.organization = Some(organization);
        self
    }

    pub fn with_experiment_id(mut self, experiment_id: impl Into<String>) -> Self {
        self.experiment_id = Some(experiment_id.into());
        self
    }

    pub fn with_feature_slug(mut self, feature_slug: impl Into<String>) -> Self {
        self.feature_slug = Some(feature_slug.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_evaluators<I, S>(mut self, evaluators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.evaluators
            .get_or_insert_with(Vec::new)
            .extend(evaluators.into_iter().map(Into::into));
        self
    }

    pub fn with_evaluation_config(mut self, config: EvaluationConfig) -> Self {
        self.evaluation_config = Some(config);
        self
    }

    pub fn with_prompt(mut self, prompt: PromptMetadata) -> Self {
        self.prompts.get_or_insert_with(Vec::new).push(prompt);
        self
    }

    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_model_defaults_to_unknown() {
        let meta = PromptMetadata::new("welcome");
        assert_eq!(meta.model.provider, "unknown");
        assert_eq!(meta.model.model, "unknown");
        assert!(!meta.from_cache);
    }

    #[test]
    fn test_prompt_slug_validity() {
        assert!(PromptMetadata::new(" welcome ").is_valid());
        assert_eq!(PromptMetadata::new(" welcome ").valid_slug(), Some("welcome"));
        assert!(!PromptMetadata::new("   ").is_valid());
        assert!(!PromptMetadata::new("").is_valid());
    }

    #[test]
    fn test_clamped_sample_rate() {
        assert_eq!(EvaluationConfig::with_sample_rate(1.5).clamped_sample_rate(), Some(1.0));
        assert_eq!(EvaluationConfig::with_sample_rate(-2.0).clamped_sample_rate(), Some(0.0));
        assert_eq!(EvaluationConfig::with_sample_rate(0.25).clamped_sample_rate(), Some(0.25));
        assert_eq!(EvaluationConfig::with_sample_rate(f64::NAN).clamped_sample_rate(), None);
        assert_eq!(EvaluationConfig::default().clamped_sample_rate(), None);
    }

    #[test]
    fn test_context_is_empty() {
        assert!(ObservationContext::new().is_empty());
        assert!(!ObservationContext::new().with_feature_slug("f").is_empty());
    }

    #[test]
    fn test_context_serde_camel_case() {
        let ctx = ObservationContext::new()
            .with_experiment_id("exp-1")
            .with_user(Identity::new("u1").with_extra("plan", "pro"));
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["experimentId"], "exp-1");
        assert_eq!(json["user"]["plan"], "pro");

        let back: ObservationContext = serde_json::from_value(json).unwrap();
        assert_eq!(back, ctx);
    }
}
