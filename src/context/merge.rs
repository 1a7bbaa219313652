// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Merging a partial context into an enclosing one.
//!
//! Rules:
//! - scalars (`experiment_id`, `feature_slug`) are overridden
//! - `user`, `organization`, `metadata` and `evaluation_config` merge by key
//! - `evaluators` is the deduplicated union, first occurrence keeps its place
//! - `prompts` are upserted by trimmed slug; a later prompt with a known slug
//!   replaces the earlier one in place

use serde_json::{Map, Value};

use super::types::{EvaluationConfig, Identity, ObservationContext, PromptMetadata};

impl ObservationContext {
    /// Build the context for a nested scope: `self` overlaid with `incoming`.
    pub fn merge(&self, incoming: &ObservationContext) -> ObservationContext {
        ObservationContext {
            user: merge_identity(&self.user, &incoming.user),
            organization: merge_identity(&self.organization, &incoming.organization),
            experiment_id: incoming
                .experiment_id
                .clone()
                .or_else(|| self.experiment_id.clone()),
            feature_slug: incoming
                .feature_slug
                .clone()
                .or_else(|| self.feature_slug.clone()),
            metadata: merge_map(&self.metadata, &incoming.metadata),
            evaluators: merge_evaluators(&self.evaluators, &incoming.evaluators),
            evaluation_config: merge_evaluation_config(
                &self.evaluation_config,
                &incoming.evaluation_config,
            ),
            prompts: merge_prompts(&self.prompts, &incoming.prompts),
        }
    }
}

fn merge_identity(existing: &Option<Identity>, incoming: &Option<Identity>) -> Option<Identity> {
    match (existing, incoming) {
        (None, None) => None,
        (Some(e), None) => Some(e.clone()),
        (None, Some(i)) => Some(i.clone()),
        (Some(e), Some(i)) => {
            let mut extra = e.extra.clone();
            extra.extend(i.extra.clone());
            Some(Identity {
                id: i.id.clone().or_else(|| e.id.clone()),
                name: i.name.clone().or_else(|| e.name.clone()),
                extra,
            })
        }
    }
}

fn merge_map(
    existing: &Option<Map<String, Value>>,
    incoming: &Option<Map<String, Value>>,
) -> Option<Map<String, Value>> {
    match (existing, incoming) {
        (None, None) => None,
        (Some(e), None) => Some(e.clone()),
        (None, Some(i)) => Some(i.clone()),
        (Some(e), Some(i)) => {
            let mut merged = e.clone();
            merged.extend(i.clone());
            Some(merged)
        }
    }
}

fn merge_evaluation_config(
    existing: &Option<EvaluationConfig>,
    incoming: &Option<EvaluationConfig>,
) -> Option<EvaluationConfig> {
    match (existing, incoming) {
        (None, None) => None,
        (Some(e), None) => Some(e.clone()),
        (None, Some(i)) => Some(i.clone()),
        (Some(e), Some(i)) => Some(EvaluationConfig {
            sample_rate: i.sample_rate.or(e.sample_rate),
        }),
    }
}

/// Trimmed, non-blank evaluators in first-seen order without duplicates.
pub(crate) fn normalize_evaluators<'a>(evaluators: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for evaluator in evaluators {
        let trimmed = evaluator.trim();
        if !trimmed.is_empty() && !result.iter().any(|e| e == trimmed) {
            result.push(trimmed.to_string());
        }
    }
    result
}

fn merge_evaluators(
    existing: &Option<Vec<String>>,
    incoming: &Option<Vec<String>>,
) -> Option<Vec<String>> {
    if existing.is_none() && incoming.is_none() {
        return None;
    }
    let all = existing.iter().flatten().chain(incoming.iter().flatten());
    Some(normalize_evaluators(all))
}

fn merge_prompts(
    existing: &Option<Vec<PromptMetadata>>,
    incoming: &Option<Vec<PromptMetadata>>,
) -> Option<Vec<PromptMetadata>> {
    if existing.is_none() && incoming.is_none() {
        return None;
    }

    let mut slugs: Vec<String> = Vec::new();
    let mut merged: Vec<PromptMetadata> = Vec::new();

    for prompt in existing.iter().flatten().chain(incoming.iter().flatten()) {
        let Some(slug) = prompt.valid_slug() else {
            continue;
        };
        let stored = PromptMetadata {
            slug: slug.to_string(),
            ..prompt.clone()
        };
        match slugs.iter().position(|s| s == slug) {
            Some(index) => merged[index] = stored,
            None => {
                slugs.push(slug.to_string());
                merged.push(stored);
            }
        }
    }

    Some(merged)
}
