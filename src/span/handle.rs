// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Restricted handles over host spans.
//!
//! [`SpanHandle`] is what nested work gets. [`StartSpanHandle`] is the root
//! of an observed operation: it dereferences to a `SpanHandle` and adds the
//! root-only annotations, which a plain `SpanHandle` cannot reach.

use std::fmt;
use std::future::Future;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::Instrument;

use crate::attributes::{keys, sanitize_serializable, AttributeValue, Attributes};
use crate::context::{self, EvaluationConfig, Identity, ObservationContext, ObservationScope};
use crate::host::{HostSpan, NoopSpan, SpanId, SpanStatus};

/// Handle over one span started through the SDK.
#[derive(Clone)]
pub struct SpanHandle {
    span: Arc<dyn HostSpan>,
}

impl SpanHandle {
    pub(crate) fn new(span: Arc<dyn HostSpan>) -> Self {
        Self { span }
    }

    /// A handle whose span discards everything.
    pub fn noop() -> Self {
        Self::new(Arc::new(NoopSpan::new()))
    }

    pub fn id(&self) -> SpanId {
        self.span.id()
    }

    /// Set an attribute from any serializable value.
    ///
    /// Primitives and arrays of one primitive type are stored as-is, other
    /// values as JSON strings. `null` and values that fail to serialize are
    /// dropped.
    pub fn set_attribute(&self, key: &str, value: impl Serialize) {
        if let Some(value) = sanitize_serializable(&value) {
            self.span.set_attribute(key, value);
        }
    }

    /// Set several attributes at once, sanitizing each value.
    pub fn set_attributes<K, V, I>(&self, attributes: I)
    where
        K: AsRef<str>,
        V: Serialize,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in attributes {
            self.set_attribute(key.as_ref(), value);
        }
    }

    /// Set an already typed attribute value.
    pub fn set_attribute_value(&self, key: &str, value: AttributeValue) {
        self.span.set_attribute(key, value);
    }

    pub(crate) fn set_attribute_map(&self, attributes: Attributes) {
        for (key, value) in attributes {
            self.span.set_attribute(&key, value);
        }
    }

    pub fn set_status(&self, status: SpanStatus) {
        self.span.set_status(status);
    }

    pub fn add_event(&self, name: &str, attributes: Attributes) {
        self.span.add_event(name, attributes);
    }

    /// Record an error on the span and mark the span as failed with its message.
    pub fn record_exception(&self, error: &dyn fmt::Display) {
        let message = error.to_string();
        self.span.record_exception(&message);
        self.span.set_status(SpanStatus::Error(message));
    }

    /// End the span. Later calls are ignored.
    pub fn end(&self) {
        self.span.end();
    }

    pub fn is_recording(&self) -> bool {
        self.span.is_recording()
    }

    /// The backing `tracing` span, or a disabled one.
    pub(crate) fn tracing_span(&self) -> tracing::Span {
        self.span.tracing_span().unwrap_or_else(tracing::Span::none)
    }
}

impl fmt::Debug for SpanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanHandle").field("id", &self.id()).finish()
    }
}

/// Experiment an observed operation belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Experiment {
    pub id: String,
    pub name: Option<String>,
    pub feature_slug: Option<String>,
}

impl Experiment {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_feature_slug(mut self, feature_slug: impl Into<String>) -> Self {
        self.feature_slug = Some(feature_slug.into());
        self
    }
}

/// Root span of an observed operation.
///
/// Not active and not ended on creation: call [`activate`](Self::activate)
/// to make it the parent of nested spans and merge its context fragment into
/// the ambient context, and [`end`](SpanHandle::end) when done.
#[derive(Clone)]
pub struct StartSpanHandle {
    base: SpanHandle,
    fragment: Arc<Mutex<ObservationContext>>,
}

impl StartSpanHandle {
    pub(crate) fn new(base: SpanHandle, fragment: ObservationContext) -> Self {
        Self {
            base,
            fragment: Arc::new(Mutex::new(fragment)),
        }
    }

    fn fragment(&self) -> MutexGuard<'_, ObservationContext> {
        self.fragment.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Context this root contributes when activated.
    pub fn context_fragment(&self) -> ObservationContext {
        self.fragment().clone()
    }

    pub fn feature_slug(&self) -> Option<String> {
        self.fragment().feature_slug.clone()
    }

    /// Change the feature slug contributed to nested scopes.
    ///
    /// The slug stamped when the span started stays on the span; a new slug
    /// overwrites the attribute, `None` only clears the fragment.
    pub fn set_feature_slug(&self, feature_slug: Option<&str>) {
        if let Some(slug) = feature_slug {
            self.base.set_attribute_value(keys::FEATURE_SLUG, slug.into());
        }
        self.fragment().feature_slug = feature_slug.map(str::to_string);
    }

    pub fn set_experiment(&self, experiment: Experiment) {
        self.base
            .set_attribute_value(keys::EXPERIMENT_ID, experiment.id.as_str().into());
        if let Some(name) = &experiment.name {
            self.base
                .set_attribute_value(keys::EXPERIMENT_NAME, name.as_str().into());
        }
        if let Some(slug) = &experiment.feature_slug {
            self.base
                .set_attribute_value(keys::EXPERIMENT_FEATURE_SLUG, slug.as_str().into());
        }
        self.fragment().experiment_id = Some(experiment.id);
    }

    /// Attach the user and/or organization this operation runs for.
    pub fn set_identity(&self, user: Option<Identity>, organization: Option<Identity>) {
        let mut fragment = self.fragment();
        if let Some(user) = user {
            self.stamp_identity(&user, keys::USER_ID, keys::USER_NAME);
            fragment.user = Some(user);
        }
        if let Some(organization) = organization {
            self.stamp_identity(&organization, keys::ORGANIZATION_ID, keys::ORGANIZATION_NAME);
            fragment.organization = Some(organization);
        }
    }

    pub fn set_evaluation_config(&self, config: EvaluationConfig) {
        if let Some(rate) = config.clamped_sample_rate() {
            self.base
                .set_attribute_value(keys::EVALUATION_SAMPLE_RATE, rate.into());
        }
        self.fragment().evaluation_config = Some(config);
    }

    fn stamp_identity(&self, identity: &Identity, id_key: &str, name_key: &str) {
        if let Some(id) = &identity.id {
            self.base.set_attribute_value(id_key, id.as_str().into());
        }
        if let Some(name) = &identity.name {
            self.base.set_attribute_value(name_key, name.as_str().into());
        }
    }

    /// Scope in which this root is active.
    pub fn activation_scope(&self) -> ObservationScope {
        let mut ambient = context::ambient();
        ambient.context = Arc::new(ambient.context.merge(&self.context_fragment()));
        ambient.active_span = Some(self.id());
        ambient.root_span = Some(self.clone());
        ObservationScope::from_ambient(ambient)
    }

    /// Run `future` with this root as the active span and root.
    pub async fn activate<F: Future>(&self, future: F) -> F::Output {
        let instrumented = future.instrument(self.base.tracing_span());
        self.activation_scope().run(instrumented).await
    }

    /// Synchronous variant of [`activate`](Self::activate).
    pub fn activate_sync<R>(&self, f: impl FnOnce() -> R) -> R {
        let span = self.base.tracing_span();
        self.activation_scope().run_sync(|| span.in_scope(f))
    }
}

impl Deref for StartSpanHandle {
    type Target = SpanHandle;

    fn deref(&self) -> &SpanHandle {
        &self.base
    }
}

impl fmt::Debug for StartSpanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartSpanHandle")
            .field("id", &self.id())
            .field("feature_slug", &self.feature_slug())
            .finish()
    }
}
