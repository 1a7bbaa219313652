// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Subscriber layer stamping the ambient context onto `tracing` spans.

use tracing::{span, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::stamper::context_stamp;
use crate::host::ObservedSpan;

/// The span-start hook for spans created directly through `tracing`.
///
/// Any `tracing` span opened inside an observed scope, by this crate or by
/// an instrumented dependency, gets the trace markers and context attributes
/// in its [`ObservedSpan`] extension. Spans outside a scope are untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContextLayer;

impl ContextLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for ContextLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, _attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let stamp = context_stamp();
        if stamp.is_empty() {
            return;
        }
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<ObservedSpan>() {
            Some(observed) => observed.attributes.extend(stamp),
            None => extensions.insert(ObservedSpan {
                attributes: stamp,
                ..Default::default()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    use crate::attributes::{keys, AttributeValue};
    use crate::context::{Identity, ObservationContext};
    use crate::host::{capture::CaptureLayer, InMemoryTracer, TracingTracer};
    use crate::span::{ObserveOptions, Observer, SdkInfo};

    #[tokio::test]
    async fn test_plain_tracing_span_inside_observe_gets_context() {
        let capture = CaptureLayer::default();
        let subscriber = Registry::default().with(ContextLayer::new()).with(capture.clone());
        let _default = tracing::subscriber::set_default(subscriber);

        let observer = Observer::new(Some(Arc::new(InMemoryTracer::new())), SdkInfo::default());
        let options = ObserveOptions::new("support-bot", "answer")
            .context(ObservationContext::new().with_user(Identity::new("u42")));

        observer
            .observe(options, |_root| async {
                drop(tracing::info_span!("http.request"));
                Ok::<_, String>(())
            })
            .await
            .unwrap();
        drop(tracing::info_span!("outside"));

        let request = capture.named("http.request").unwrap();
        assert_eq!(
            request.observed.attribute(keys::TRACE),
            Some(&AttributeValue::Bool(true))
        );
        assert_eq!(request.observed.str_attribute(keys::FEATURE_SLUG), Some("support-bot"));
        assert_eq!(request.observed.str_attribute(keys::USER_ID), Some("u42"));

        let outside = capture.named("outside").unwrap();
        assert!(outside.observed.attributes.is_empty());
    }

    #[tokio::test]
    async fn test_dependency_spans_nest_under_root() {
        let capture = CaptureLayer::default();
        let subscriber = Registry::default().with(ContextLayer::new()).with(capture.clone());
        let _default = tracing::subscriber::set_default(subscriber);

        let tracer = TracingTracer::new();
        let observer = Observer::new(Some(Arc::new(tracer.clone())), SdkInfo::default());

        observer
            .observe(ObserveOptions::new("support-bot", "answer"), |_root| async {
                drop(tracing::info_span!("llm.completion"));
                Ok::<_, String>(())
            })
            .await
            .unwrap();

        let completion = capture.named("llm.completion").unwrap();
        assert_eq!(completion.parent.as_deref(), Some("answer"));
        assert_eq!(
            completion.observed.str_attribute(keys::FEATURE_SLUG),
            Some("support-bot")
        );

        let root = capture.named("answer").unwrap();
        assert_eq!(root.observed.str_attribute(keys::SPAN_TYPE), Some("answer"));
        assert_eq!(tracer.open_count(), 0);
    }
}
