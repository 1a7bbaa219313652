// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Starting spans around units of work.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;

use crate::attributes::{keys, sanitize_serializable, AttributeValue, Attributes};
use crate::context::{self, ObservationContext};
use crate::host::{HostTracer, SpanOptions, SpanStatus};

use super::handle::{SpanHandle, StartSpanHandle};
use super::stamper::ContextStamper;

/// Span kind used when none is given.
pub const DEFAULT_SPAN_KIND: &str = "span";

/// Tracer name used for spans the observer starts on its own behalf.
pub const OBSERVE_TRACER: &str = "observe-sdk";

/// SDK identification stamped on every span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkInfo {
    pub name: String,
    pub version: String,
    pub target: String,
    /// Application name, stamped when set.
    pub app_name: Option<String>,
}

impl Default for SdkInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            target: "rust".to_string(),
            app_name: None,
        }
    }
}

/// Options for [`Observer::scoped`].
#[derive(Debug, Clone, Default)]
pub struct ScopedOptions {
    pub kind: Option<String>,
    pub attributes: Attributes,
}

impl ScopedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Add an explicit attribute. Explicit attributes win over inherited ones.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Some(value) = sanitize_serializable(&value) {
            self.attributes.insert(key.into(), value);
        }
        self
    }
}

/// Options for [`Observer::observe`] and [`Observer::start_observe`].
#[derive(Debug, Clone)]
pub struct ObserveOptions {
    pub name: String,
    pub feature_slug: String,
    pub kind: Option<String>,
    pub attributes: Attributes,
    /// Extra context merged in while the root is active.
    pub context: ObservationContext,
}

impl ObserveOptions {
    /// A root span must always name the feature it belongs to.
    pub fn new(feature_slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feature_slug: feature_slug.into(),
            kind: None,
            attributes: Attributes::new(),
            context: ObservationContext::new(),
        }
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Some(value) = sanitize_serializable(&value) {
            self.attributes.insert(key.into(), value);
        }
        self
    }

    pub fn context(mut self, context: ObservationContext) -> Self {
        self.context = context;
        self
    }
}

/// Ends a span exactly once, whatever way the work exits.
struct EndGuard {
    span: SpanHandle,
}

impl Drop for EndGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.span.record_exception(&"panicked");
        }
        self.span.end();
    }
}

/// Entry point for creating spans.
///
/// Holds the optional host tracer. Without one every operation still runs
/// the caller's work, against handles backed by no-op spans.
#[derive(Clone, Default)]
pub struct Observer {
    tracer: Option<Arc<dyn HostTracer>>,
    sdk: SdkInfo,
}

impl Observer {
    /// Create an observer and register the context stamper with the tracer.
    ///
    /// The stamper is registered at most once per tracer, however many
    /// observers share it.
    pub fn new(tracer: Option<Arc<dyn HostTracer>>, sdk: SdkInfo) -> Self {
        if let Some(tracer) = &tracer {
            tracer.register_span_start_hook(ContextStamper::shared());
        }
        Self { tracer, sdk }
    }

    /// An observer with no tracer.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.tracer.is_some()
    }

    pub fn sdk(&self) -> &SdkInfo {
        &self.sdk
    }

    /// The innermost active root span, if any.
    pub fn root_span(&self) -> Option<StartSpanHandle> {
        context::root_span()
    }

    fn base_attributes(&self, kind: Option<&str>, span_type: &str) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert(keys::TRACE.into(), AttributeValue::Bool(true));
        attrs.insert(keys::IN_TRACE.into(), "true".into());
        attrs.insert(
            keys::SPAN_KIND.into(),
            kind.unwrap_or(DEFAULT_SPAN_KIND).into(),
        );
        attrs.insert(keys::SDK_NAME.into(), self.sdk.name.as_str().into());
        attrs.insert(keys::SDK_VERSION.into(), self.sdk.version.as_str().into());
        attrs.insert(keys::SDK_TARGET.into(), self.sdk.target.as_str().into());
        if let Some(app_name) = &self.sdk.app_name {
            attrs.insert(keys::APP_NAME.into(), app_name.as_str().into());
        }
        attrs.insert(keys::SPAN_TYPE.into(), span_type.into());
        attrs
    }

    fn start(&self, tracer_name: &str, name: &str, attributes: Attributes) -> SpanHandle {
        match &self.tracer {
            Some(tracer) => {
                let options = SpanOptions::new(tracer_name)
                    .with_parent(context::active_span_id())
                    .with_attributes(attributes);
                SpanHandle::new(tracer.start_span(name, options))
            }
            None => SpanHandle::noop(),
        }
    }

    /// Run `work` inside a new span named `span_name`.
    ///
    /// The span carries the SDK markers, the current context attributes and
    /// `options.attributes`, the latter winning on collisions. It ends when
    /// `work` completes: `Ok` sets an OK status, `Err` is recorded on the
    /// span and returned unchanged.
    pub async fn scoped<T, E, F, Fut>(
        &self,
        tracer_name: &str,
        span_name: &str,
        options: ScopedOptions,
        work: F,
    ) -> Result<T, E>
    where
        F: FnOnce(SpanHandle) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attributes = self.base_attributes(options.kind.as_deref(), span_name);
        attributes.extend(context::extract_attributes());
        attributes.extend(options.attributes);

        let span = self.start(tracer_name, span_name, attributes);
        let guard = EndGuard { span: span.clone() };

        let result = work(span.clone()).instrument(span.tracing_span()).await;
        finish(&span, &result);
        drop(guard);
        result
    }

    /// Create a root span that is neither active nor ended.
    ///
    /// The caller activates it with [`StartSpanHandle::activate`] and must
    /// end it explicitly.
    pub fn start_observe(&self, options: ObserveOptions) -> StartSpanHandle {
        if options.feature_slug.trim().is_empty() {
            tracing::warn!(span = %options.name, "Root span started without a feature slug");
        }

        let fragment = options
            .context
            .clone()
            .with_feature_slug(options.feature_slug.clone());

        let mut attributes = self.base_attributes(options.kind.as_deref(), &options.name);
        attributes.extend(context::current().merge(&fragment).to_attributes());
        attributes.insert(keys::FEATURE_SLUG.into(), options.feature_slug.as_str().into());
        attributes.extend(options.attributes);

        let span = self.start(OBSERVE_TRACER, &options.name, attributes);
        StartSpanHandle::new(span, fragment)
    }

    /// Run `work` under a new root span that is active for its duration.
    ///
    /// Spans started inside `work` are parented to the root, and the root is
    /// reachable through [`Observer::root_span`]. The root ends when `work`
    /// completes.
    pub async fn observe<T, E, F, Fut>(&self, options: ObserveOptions, work: F) -> Result<T, E>
    where
        F: FnOnce(StartSpanHandle) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let root = self.start_observe(options);
        let guard = EndGuard {
            span: (*root).clone(),
        };

        let handle = root.clone();
        let result = root.activate(async move { work(handle).await }).await;
        finish(&root, &result);
        drop(guard);
        result
    }
}

fn finish<T, E: fmt::Display>(span: &SpanHandle, result: &Result<T, E>) {
    match result {
        Ok(_) => span.set_status(SpanStatus::Ok),
        Err(e) => span.record_exception(e),
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("enabled", &self.is_enabled())
            .field("sdk", &self.sdk)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Identity;
    use crate::host::InMemoryTracer;

    fn observer() -> (Observer, InMemoryTracer) {
        let tracer = InMemoryTracer::new();
        let observer = Observer::new(Some(Arc::new(tracer.clone())), SdkInfo::default());
        (observer, tracer)
    }

    #[test]
    fn test_stamper_registered_once_per_tracer() {
        let tracer = InMemoryTracer::new();
        for _ in 0..3 {
            Observer::new(Some(Arc::new(tracer.clone())), SdkInfo::default());
        }
        assert_eq!(tracer.hook_count(), 1);

        context::with_context_sync(ObservationContext::new().with_feature_slug("f"), || {
            tracer.start_span("third-party", SpanOptions::new("lib")).end();
        });
        let span = tracer.span_named("third-party").unwrap();
        assert_eq!(span.str_attribute(keys::FEATURE_SLUG), Some("f"));
    }

    #[tokio::test]
    async fn test_scoped_success_sets_ok_and_markers() {
        let (observer, tracer) = observer();

        let value: Result<i32, String> = observer
            .scoped("tests", "compute", ScopedOptions::new().kind("generation"), |_span| async {
                Ok(42)
            })
            .await;
        assert_eq!(value, Ok(42));

        let span = tracer.span_named("compute").unwrap();
        assert_eq!(span.status, SpanStatus::Ok);
        assert_eq!(span.tracer_name, "tests");
        assert_eq!(span.attribute(keys::TRACE), Some(&AttributeValue::Bool(true)));
        assert_eq!(span.str_attribute(keys::IN_TRACE), Some("true"));
        assert_eq!(span.str_attribute(keys::SPAN_KIND), Some("generation"));
        assert_eq!(span.str_attribute(keys::SPAN_TYPE), Some("compute"));
        assert_eq!(span.str_attribute(keys::SDK_NAME), Some(env!("CARGO_PKG_NAME")));
    }

    #[tokio::test]
    async fn test_scoped_error_recorded_and_returned() {
        let (observer, tracer) = observer();

        let result: Result<(), String> = observer
            .scoped("tests", "fail", ScopedOptions::new(), |_span| async {
                Err("upstream unavailable".to_string())
            })
            .await;
        assert_eq!(result, Err("upstream unavailable".to_string()));

        let span = tracer.span_named("fail").unwrap();
        assert_eq!(span.status, SpanStatus::Error("upstream unavailable".into()));
        assert_eq!(span.exceptions.len(), 1);
        assert_eq!(span.str_attribute(keys::SPAN_KIND), Some(DEFAULT_SPAN_KIND));
        assert_eq!(tracer.open_count(), 0);
    }

    #[tokio::test]
    async fn test_explicit_attributes_win_over_context() {
        let (observer, tracer) = observer();
        let ctx = ObservationContext::new()
            .with_feature_slug("from-context")
            .with_user(Identity::new("u1"));

        context::with_context(ctx, async {
            observer
                .scoped(
                    "tests",
                    "override",
                    ScopedOptions::new().attribute(keys::FEATURE_SLUG, "explicit"),
                    |_span| async { Ok::<_, String>(()) },
                )
                .await
        })
        .await
        .unwrap();

        let span = tracer.span_named("override").unwrap();
        assert_eq!(span.str_attribute(keys::FEATURE_SLUG), Some("explicit"));
        assert_eq!(span.str_attribute(keys::USER_ID), Some("u1"));
    }

    #[tokio::test]
    async fn test_disabled_observer_runs_work() {
        let observer = Observer::disabled();
        let result: Result<&str, String> = observer
            .scoped("tests", "noop", ScopedOptions::new(), |span| async move {
                span.set_attribute("ignored", true);
                assert!(!span.is_recording());
                Ok("done")
            })
            .await;
        assert_eq!(result, Ok("done"));

        let root = observer.start_observe(ObserveOptions::new("feature", "root"));
        assert!(!root.is_recording());
    }

    #[tokio::test]
    async fn test_observe_parents_nested_spans() {
        let (observer, tracer) = observer();

        let nested = observer.clone();
        let result: Result<(), String> = observer
            .observe(ObserveOptions::new("checkout", "handle-order"), |root| async move {
                assert_eq!(nested.root_span().map(|r| r.id()), Some(root.id()));
                assert_eq!(context::current().feature_slug.as_deref(), Some("checkout"));
                nested
                    .scoped("tests", "child", ScopedOptions::new(), |_span| async { Ok(()) })
                    .await
            })
            .await;
        assert!(result.is_ok());
        assert!(observer.root_span().is_none());

        let root = tracer.span_named("handle-order").unwrap();
        let child = tracer.span_named("child").unwrap();
        assert_eq!(child.parent, Some(root.id));
        assert_eq!(child.str_attribute(keys::FEATURE_SLUG), Some("checkout"));
        assert_eq!(root.str_attribute(keys::FEATURE_SLUG), Some("checkout"));
        assert_eq!(root.status, SpanStatus::Ok);
    }

    #[tokio::test]
    async fn test_start_observe_is_not_active_or_ended() {
        let (observer, tracer) = observer();

        let root = observer.start_observe(ObserveOptions::new("reports", "nightly"));
        assert!(context::root_span().is_none());
        assert!(root.is_recording());
        assert_eq!(tracer.open_count(), 1);

        root.set_identity(None, Some(Identity::new("org-9")));
        root.activate(async {
            assert_eq!(
                context::current().organization.clone().and_then(|o| o.id).as_deref(),
                Some("org-9")
            );
        })
        .await;

        root.end();
        let span = tracer.span_named("nightly").unwrap();
        assert_eq!(span.str_attribute(keys::FEATURE_SLUG), Some("reports"));
        assert_eq!(span.str_attribute(keys::ORGANIZATION_ID), Some("org-9"));
    }

    #[tokio::test]
    async fn test_panicking_work_still_ends_span() {
        let (observer, tracer) = observer();
        let observer_task = observer.clone();

        let joined = tokio::spawn(async move {
            observer_task
                .scoped("tests", "explodes", ScopedOptions::new(), |_span| async {
                    if true {
                        panic!("boom");
                    }
                    Ok::<(), String>(())
                })
                .await
        })
        .await;
        assert!(joined.is_err());

        let span = tracer.span_named("explodes").unwrap();
        assert!(span.status.is_error());
        assert_eq!(tracer.open_count(), 0);
    }
}
