// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Contract with the host tracing substrate.
//!
//! The SDK never exports spans itself. It drives whatever tracer the
//! application installed through the narrow [`HostTracer`] / [`HostSpan`]
//! traits, and the tracer is always optional: when it is absent every span
//! operation lands on a [`NoopSpan`].
//!
//! Three implementations ship with the crate:
//!
//! - [`TracingTracer`] - starts `tracing` spans for the application's subscriber
//! - [`NoopTracer`] - accepts everything, records nothing
//! - [`InMemoryTracer`] - keeps finished spans in memory for inspection

mod bridge;
mod ids;
mod memory;
mod noop;

use std::sync::Arc;

pub use bridge::{with_observed, ObservedSpan, TracingTracer, BRIDGE_TARGET};
#[cfg(test)]
pub(crate) use bridge::capture;
pub use ids::{SpanId, TraceId};
pub use memory::{FinishedSpan, InMemoryTracer, SpanEvent};
pub use noop::{NoopSpan, NoopTracer};

use crate::attributes::{AttributeValue, Attributes};

/// Final status of a span.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpanStatus {
    #[default]
    Unset,
    Ok,
    Error(String),
}

impl SpanStatus {
    /// Check whether this is an error status.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Options passed to [`HostTracer::start_span`].
#[derive(Debug, Clone, Default)]
pub struct SpanOptions {
    /// Name of the instrumentation scope creating the span.
    pub tracer_name: String,
    /// Parent span, if the new span is nested.
    pub parent: Option<SpanId>,
    /// Creation-time attributes.
    pub attributes: Attributes,
}

impl SpanOptions {
    pub fn new(tracer_name: impl Into<String>) -> Self {
        Self {
            tracer_name: tracer_name.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: Option<SpanId>) -> Self {
        self.parent = parent;
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// One live span owned by the host tracer.
///
/// All methods take `&self`; implementations use interior mutability so a
/// span can be shared between the SDK handle and the tracer.
pub trait HostSpan: Send + Sync {
    fn id(&self) -> SpanId;

    fn set_attribute(&self, key: &str, value: AttributeValue);

    fn set_status(&self, status: SpanStatus);

    fn add_event(&self, name: &str, attributes: Attributes);

    /// Record an exception event. Does not change the status by itself.
    fn record_exception(&self, message: &str);

    /// End the span. Calls after the first are ignored.
    fn end(&self);

    /// Whether the span still accepts updates.
    fn is_recording(&self) -> bool;

    /// The `tracing` span backing this span, if any. Work run under the span
    /// is instrumented with it so spans from other libraries nest beneath.
    fn tracing_span(&self) -> Option<tracing::Span> {
        None
    }
}

/// Hook invoked by the tracer around every span it starts, whichever code
/// path created the span.
pub trait SpanStartHook: Send + Sync {
    fn on_start(&self, span: &dyn HostSpan);

    fn on_end(&self, _span: &dyn HostSpan) {}
}

/// The host tracing substrate.
///
/// Implementations must invoke every registered [`SpanStartHook`] on the
/// fresh span *before* applying [`SpanOptions::attributes`], so that
/// attributes passed explicitly at creation win over stamped ones.
pub trait HostTracer: Send + Sync {
    fn start_span(&self, name: &str, options: SpanOptions) -> Arc<dyn HostSpan>;

    /// Register a hook. Registering an `Arc` that is already registered
    /// is a no-op.
    fn register_span_start_hook(&self, hook: Arc<dyn SpanStartHook>);
}
