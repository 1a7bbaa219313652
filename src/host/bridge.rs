// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Host tracer backed by the `tracing` crate.
//!
//! Every SDK span becomes a `tracing` span, so whatever subscriber the
//! application runs (fmt output, an OpenTelemetry layer) receives it.
//! Attributes and status live in the span's [`ObservedSpan`] extension in
//! the subscriber registry, where exporting layers read them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tracing::{Level, Span};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Registry;

use super::{HostSpan, HostTracer, SpanId, SpanOptions, SpanStartHook, SpanStatus};
use crate::attributes::{AttributeValue, Attributes};

/// Target of every span and event the bridge emits.
pub const BRIDGE_TARGET: &str = "observe_sdk::span";

/// Observation data attached to a `tracing` span.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservedSpan {
    pub attributes: Attributes,
    pub status: SpanStatus,
}

impl ObservedSpan {
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn str_attribute(&self, key: &str) -> Option<&str> {
        self.attribute(key).and_then(AttributeValue::as_str)
    }
}

/// Run `f` on the span's [`ObservedSpan`], creating it if missing.
///
/// Returns `None` when the span is disabled or the active subscriber is not
/// built on a [`Registry`].
pub fn with_observed<R>(span: &Span, f: impl FnOnce(&mut ObservedSpan) -> R) -> Option<R> {
    span.with_subscriber(|(id, dispatch)| {
        let registry = dispatch.downcast_ref::<Registry>()?;
        let span = registry.span(id)?;
        let mut extensions = span.extensions_mut();
        if extensions.get_mut::<ObservedSpan>().is_none() {
            extensions.insert(ObservedSpan::default());
        }
        extensions.get_mut::<ObservedSpan>().map(f)
    })
    .flatten()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn render(attributes: &Attributes) -> String {
    attributes
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Default)]
struct Shared {
    hooks: RwLock<Vec<Arc<dyn SpanStartHook>>>,
    live: Mutex<HashMap<SpanId, Span>>,
}

struct BridgeSpan {
    id: SpanId,
    span: Mutex<Option<Span>>,
    shared: Arc<Shared>,
}

impl BridgeSpan {
    fn current(&self) -> Option<Span> {
        lock(&self.span).clone()
    }
}

impl HostSpan for BridgeSpan {
    fn id(&self) -> SpanId {
        self.id
    }

    fn set_attribute(&self, key: &str, value: AttributeValue) {
        if let Some(span) = self.current() {
            with_observed(&span, |observed| {
                observed.attributes.insert(key.to_string(), value);
            });
        }
    }

    fn set_status(&self, status: SpanStatus) {
        if let Some(span) = self.current() {
            with_observed(&span, |observed| observed.status = status);
        }
    }

    fn add_event(&self, name: &str, attributes: Attributes) {
        if let Some(span) = self.current() {
            tracing::event!(
                target: BRIDGE_TARGET,
                parent: &span,
                Level::INFO,
                event = %name,
                attributes = %render(&attributes),
            );
        }
    }

    fn record_exception(&self, message: &str) {
        if let Some(span) = self.current() {
            tracing::event!(
                target: BRIDGE_TARGET,
                parent: &span,
                Level::ERROR,
                exception.message = %message,
                "exception"
            );
        }
    }

    fn end(&self) {
        let Some(span) = lock(&self.span).take() else {
            return;
        };
        lock(&self.shared.live).remove(&self.id);

        let hooks = self.shared.hooks.read().map(|h| h.clone()).unwrap_or_default();
        for hook in hooks {
            hook.on_end(self);
        }
        drop(span);
    }

    fn is_recording(&self) -> bool {
        lock(&self.span).is_some()
    }

    fn tracing_span(&self) -> Option<Span> {
        self.current()
    }
}

/// Tracer that starts SDK spans as `tracing` spans.
///
/// Parents are resolved among the spans this tracer started and has not
/// ended; a span without one nests under the current `tracing` span.
#[derive(Clone, Default)]
pub struct TracingTracer {
    shared: Arc<Shared>,
}

impl TracingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of spans started but not yet ended.
    pub fn open_count(&self) -> usize {
        lock(&self.shared.live).len()
    }
}

impl HostTracer for TracingTracer {
    fn start_span(&self, name: &str, options: SpanOptions) -> Arc<dyn HostSpan> {
        let parent = options
            .parent
            .and_then(|parent| lock(&self.shared.live).get(&parent).cloned());

        let span = match parent {
            Some(parent) => tracing::info_span!(
                target: BRIDGE_TARGET,
                parent: &parent,
                "observe",
                otel.name = %name,
                observe.tracer = %options.tracer_name,
            ),
            None => tracing::info_span!(
                target: BRIDGE_TARGET,
                "observe",
                otel.name = %name,
                observe.tracer = %options.tracer_name,
            ),
        };

        let id = SpanId::new();
        lock(&self.shared.live).insert(id, span.clone());
        let bridged = Arc::new(BridgeSpan {
            id,
            span: Mutex::new(Some(span)),
            shared: Arc::clone(&self.shared),
        });

        let hooks = self.shared.hooks.read().map(|h| h.clone()).unwrap_or_default();
        for hook in hooks {
            hook.on_start(bridged.as_ref());
        }

        for (key, value) in options.attributes {
            bridged.set_attribute(&key, value);
        }

        bridged
    }

    fn register_span_start_hook(&self, hook: Arc<dyn SpanStartHook>) {
        if let Ok(mut hooks) = self.shared.hooks.write() {
            if !hooks.iter().any(|h| Arc::ptr_eq(h, &hook)) {
                hooks.push(hook);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::capture::CaptureLayer;
    use super::*;
    use crate::attributes::keys;
    use crate::context::{self, ObservationContext};
    use crate::span::ContextStamper;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_spans_carry_attributes_and_parents() {
        let capture = CaptureLayer::default();
        let subscriber = Registry::default().with(capture.clone());
        let tracer = TracingTracer::new();

        tracing::subscriber::with_default(subscriber, || {
            let root = tracer.start_span("answer", SpanOptions::new("tests"));
            root.set_attribute("step", AttributeValue::Int(1));

            let child = tracer.start_span(
                "retrieve",
                SpanOptions::new("tests").with_parent(Some(root.id())),
            );
            child.set_status(SpanStatus::Error("timeout".into()));
            child.end();
            child.set_attribute("late", AttributeValue::Bool(true));
            assert!(!child.is_recording());

            root.set_status(SpanStatus::Ok);
            root.end();
        });

        let root = capture.named("answer").unwrap();
        assert_eq!(root.observed.attribute("step"), Some(&AttributeValue::Int(1)));
        assert_eq!(root.observed.status, SpanStatus::Ok);

        let child = capture.named("retrieve").unwrap();
        assert_eq!(child.parent.as_deref(), Some("answer"));
        assert_eq!(child.observed.status, SpanStatus::Error("timeout".into()));
        assert!(child.observed.attribute("late").is_none());
        assert_eq!(tracer.open_count(), 0);
    }

    #[test]
    fn test_hooks_run_before_creation_attributes() {
        let capture = CaptureLayer::default();
        let subscriber = Registry::default().with(capture.clone());
        let tracer = TracingTracer::new();
        tracer.register_span_start_hook(ContextStamper::shared());
        tracer.register_span_start_hook(ContextStamper::shared());

        tracing::subscriber::with_default(subscriber, || {
            let ctx = ObservationContext::new().with_feature_slug("search");
            context::with_context_sync(ctx, || {
                let mut attrs = Attributes::new();
                attrs.insert(keys::FEATURE_SLUG.into(), "explicit".into());
                tracer
                    .start_span("llm.call", SpanOptions::new("llm").with_attributes(attrs))
                    .end();
            });
        });

        let span = capture.named("llm.call").unwrap();
        assert_eq!(span.observed.attribute(keys::TRACE), Some(&AttributeValue::Bool(true)));
        assert_eq!(span.observed.str_attribute(keys::FEATURE_SLUG), Some("explicit"));
    }

    #[test]
    fn test_without_subscriber_spans_are_inert() {
        let tracer = TracingTracer::new();
        let span = tracer.start_span("quiet", SpanOptions::new("tests"));
        span.set_attribute("k", AttributeValue::Bool(true));
        assert!(span.is_recording());
        span.end();
        assert!(!span.is_recording());
        assert_eq!(tracer.open_count(), 0);
    }
}
