// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tracer used when no host substrate is installed.

use std::sync::Arc;

use super::{HostSpan, HostTracer, SpanId, SpanOptions, SpanStartHook, SpanStatus};
use crate::attributes::{AttributeValue, Attributes};

/// Span that discards every update.
#[derive(Debug, Default)]
pub struct NoopSpan {
    id: SpanId,
}

impl NoopSpan {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HostSpan for NoopSpan {
    fn id(&self) -> SpanId {
        self.id
    }

    fn set_attribute(&self, _key: &str, _value: AttributeValue) {}

    fn set_status(&self, _status: SpanStatus) {}

    fn add_event(&self, _name: &str, _attributes: Attributes) {}

    fn record_exception(&self, _message: &str) {}

    fn end(&self) {}

    fn is_recording(&self) -> bool {
        false
    }
}

/// Tracer whose spans are all [`NoopSpan`]s. Hooks are accepted and dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl HostTracer for NoopTracer {
    fn start_span(&self, _name: &str, _options: SpanOptions) -> Arc<dyn HostSpan> {
        Arc::new(NoopSpan::new())
    }

    fn register_span_start_hook(&self, _hook: Arc<dyn SpanStartHook>) {}
}
