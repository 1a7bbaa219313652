// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Prompt retrieval.
//!
//! Reads go through the query cache, then the live API, then the fallback
//! cache. The fallback is only consulted when the call has caching enabled.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::attributes::keys;
use crate::cache::{
    cache_key, CacheSource, CacheStatsSnapshot, Clock, FallbackGating, FetchPolicy,
    ResilientFetch, SystemClock, DEFAULT_QUERY_TTL,
};
use crate::context::{ObservationContext, PromptMetadata, PromptModel};
use crate::error::SdkError;
use crate::span::{Observer, ScopedOptions};

use super::api::{PromptApi, PromptMessage, PromptRecord, PromptRequest};
use super::template::{PlaceholderRenderer, TemplateRenderer};

/// Tracer name for prompt spans.
pub const PROMPTS_TRACER: &str = "observe-sdk.prompts";

/// Arguments for [`Prompts::get`].
#[derive(Debug, Clone, PartialEq)]
pub struct GetPrompt {
    pub slug: String,
    pub version: Option<String>,
    pub tag: Option<String>,
    pub variables: Map<String, Value>,
    /// Use the query and fallback caches. `None` uses the client default.
    pub cache: Option<bool>,
}

impl GetPrompt {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            version: None,
            tag: None,
            variables: Map::new(),
            cache: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = Some(enabled);
        self
    }

    fn key(&self) -> String {
        cache_key(
            "prompt",
            &[
                ("slug", Some(self.slug.as_str())),
                ("version", self.version.as_deref()),
                ("tag", self.tag.as_deref()),
            ],
        )
    }
}

/// A rendered prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub slug: String,
    pub version: Option<String>,
    pub tag: Option<String>,
    pub model: PromptModel,
    pub messages: Vec<PromptMessage>,
    pub parameters: Map<String, Value>,
    pub variables: Map<String, Value>,
    pub source: CacheSource,
}

impl Prompt {
    fn render(
        record: PromptRecord,
        variables: Map<String, Value>,
        source: CacheSource,
        renderer: &dyn TemplateRenderer,
    ) -> Self {
        let messages = record
            .messages
            .into_iter()
            .map(|message| PromptMessage {
                content: renderer.render(&message.content, &variables),
                role: message.role,
            })
            .collect();

        Self {
            slug: record.slug,
            version: record.version,
            tag: record.tag,
            model: record.model,
            messages,
            parameters: record.parameters,
            variables,
            source,
        }
    }

    pub fn from_cache(&self) -> bool {
        self.source.is_cached()
    }

    /// Description of this prompt for the observation context.
    pub fn metadata(&self) -> PromptMetadata {
        let mut metadata = PromptMetadata::new(self.slug.clone())
            .with_model(self.model.clone())
            .with_from_cache(self.from_cache());
        if let Some(version) = &self.version {
            metadata = metadata.with_version(version.clone());
        }
        if let Some(tag) = &self.tag {
            metadata = metadata.with_tag(tag.clone());
        }
        if !self.variables.is_empty() {
            metadata = metadata.with_variables(self.variables.clone());
        }
        metadata
    }

    /// A context fragment attaching this prompt, for
    /// [`with_merged_context`](crate::context::with_merged_context).
    pub fn context(&self) -> ObservationContext {
        ObservationContext::new().with_prompt(self.metadata())
    }
}

/// Prompt client.
pub struct Prompts {
    api: Arc<dyn PromptApi>,
    observer: Observer,
    fetch: ResilientFetch<PromptRecord>,
    renderer: Arc<dyn TemplateRenderer>,
    cache_by_default: bool,
}

impl Prompts {
    pub fn new(api: Arc<dyn PromptApi>, observer: Observer) -> Self {
        Self {
            api,
            observer,
            fetch: ResilientFetch::new(Self::policy(DEFAULT_QUERY_TTL)),
            renderer: Arc::new(PlaceholderRenderer),
            cache_by_default: true,
        }
    }

    fn policy(query_ttl: Duration) -> FetchPolicy {
        FetchPolicy::new(FallbackGating::CacheFlag).with_query_ttl(query_ttl)
    }

    /// Replace the caches. Anything cached so far is dropped.
    pub fn with_cache(mut self, query_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        self.fetch = ResilientFetch::with_clock(Self::policy(query_ttl), clock);
        self
    }

    pub fn with_query_ttl(self, query_ttl: Duration) -> Self {
        self.with_cache(query_ttl, Arc::new(SystemClock))
    }

    /// Whether requests that do not say otherwise use the caches.
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_by_default = enabled;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.fetch.stats()
    }

    /// Fetch and render a prompt.
    pub async fn get(&self, request: GetPrompt) -> Result<Prompt, SdkError> {
        if request.slug.trim().is_empty() {
            return Err(SdkError::InvalidArgument(
                "prompt slug must not be empty".to_string(),
            ));
        }

        let key = request.key();
        let cache = request.cache.unwrap_or(self.cache_by_default);
        let mut options = ScopedOptions::new()
            .kind("prompt")
            .attribute(keys::PROMPT_SLUG, &request.slug);
        if let Some(version) = &request.version {
            options = options.attribute(keys::PROMPT_VERSION, version);
        }
        if let Some(tag) = &request.tag {
            options = options.attribute(keys::PROMPT_TAG, tag);
        }

        self.observer
            .scoped(PROMPTS_TRACER, "prompts.get", options, |span| async move {
                let api_request = PromptRequest {
                    slug: request.slug,
                    version: request.version,
                    tag: request.tag,
                };
                let fetched = self
                    .fetch
                    .get(&key, cache, &span, || {
                        self.api.fetch_prompt(api_request)
                    })
                    .await?;

                let prompt = Prompt::render(
                    fetched.value,
                    request.variables,
                    fetched.source,
                    self.renderer.as_ref(),
                );
                span.set_attribute(keys::PROMPT_MODEL_PROVIDER, &prompt.model.provider);
                span.set_attribute(keys::PROMPT_MODEL_NAME, &prompt.model.model);
                span.set_attribute(keys::PROMPT_FROM_CACHE, prompt.from_cache());
                Ok::<_, SdkError>(prompt)
            })
            .await
    }
}
