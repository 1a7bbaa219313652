// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Flattening an observation context into span attributes.

use crate::attributes::{keys, sanitize, serialize_or_sentinel, AttributeValue, Attributes};

use super::merge::normalize_evaluators;
use super::types::{Identity, ObservationContext};

impl ObservationContext {
    /// Flatten this context into span attributes.
    ///
    /// Pure: the same context always yields the same map.
    pub fn to_attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();

        if let Some(user) = &self.user {
            put_identity(&mut attrs, user, keys::USER_ID, keys::USER_NAME);
        }
        if let Some(org) = &self.organization {
            put_identity(&mut attrs, org, keys::ORGANIZATION_ID, keys::ORGANIZATION_NAME);
        }
        if let Some(experiment_id) = &self.experiment_id {
            attrs.insert(keys::EXPERIMENT_ID.into(), experiment_id.as_str().into());
        }
        if let Some(feature_slug) = &self.feature_slug {
            attrs.insert(keys::FEATURE_SLUG.into(), feature_slug.as_str().into());
        }

        if let Some(metadata) = &self.metadata {
            for (key, value) in metadata {
                if let Some(value) = sanitize(value.clone()) {
                    attrs.insert(format!("{}.{}", keys::METADATA_PREFIX, key), value);
                }
            }
        }

        if let Some(evaluators) = &self.evaluators {
            let valid = normalize_evaluators(evaluators.iter());
            if !valid.is_empty() {
                attrs.insert(keys::EVALUATORS.into(), serialize_or_sentinel(&valid).into());
            }
        }

        if let Some(rate) = self
            .evaluation_config
            .as_ref()
            .and_then(|config| config.clamped_sample_rate())
        {
            attrs.insert(keys::EVALUATION_SAMPLE_RATE.into(), rate.into());
        }

        self.put_prompts(&mut attrs);

        attrs
    }

    fn put_prompts(&self, attrs: &mut Attributes) {
        let Some(prompts) = &self.prompts else {
            return;
        };
        let valid: Vec<_> = prompts.iter().filter(|p| p.is_valid()).collect();
        let Some(first) = valid.first() else {
            return;
        };

        if let Some(slug) = first.valid_slug() {
            attrs.insert(keys::PROMPT_SLUG.into(), slug.into());
        }
        if let Some(version) = &first.version {
            attrs.insert(keys::PROMPT_VERSION.into(), version.as_str().into());
        }
        if let Some(tag) = &first.tag {
            attrs.insert(keys::PROMPT_TAG.into(), tag.as_str().into());
        }
        attrs.insert(
            keys::PROMPT_MODEL_PROVIDER.into(),
            first.model.provider.as_str().into(),
        );
        attrs.insert(keys::PROMPT_MODEL_NAME.into(), first.model.model.as_str().into());
        attrs.insert(keys::PROMPT_FROM_CACHE.into(), first.from_cache.into());

        if let Some(variables) = first.variables.as_ref().filter(|v| !v.is_empty()) {
            attrs.insert(
                keys::PROMPT_VARIABLES.into(),
                serialize_or_sentinel(variables).into(),
            );
        }

        if valid.len() > 1 {
            attrs.insert(keys::PROMPTS_COUNT.into(), AttributeValue::from(valid.len()));
        }
    }
}

fn put_identity(attrs: &mut Attributes, identity: &Identity, id_key: &str, name_key: &str) {
    if let Some(id) = &identity.id {
        attrs.insert(id_key.into(), id.as_str().into());
    }
    if let Some(name) = &identity.name {
        attrs.insert(name_key.into(), name.as_str().into());
    }
}
