// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Stamps the ambient context onto every span the host tracer starts.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::attributes::{keys, AttributeValue, Attributes};
use crate::context;
use crate::host::{HostSpan, SpanStartHook};

static SHARED: Lazy<Arc<ContextStamper>> = Lazy::new(|| Arc::new(ContextStamper));

/// Span-start hook copying the current observation context onto new spans.
///
/// Runs for spans started by any code, including other instrumented
/// libraries, so their spans carry the identity and feature of the observed
/// operation they run in. Does nothing outside an observed scope.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContextStamper;

impl ContextStamper {
    /// The process-wide stamper. Registering it on a tracer that already
    /// has it leaves the tracer unchanged.
    pub fn shared() -> Arc<dyn SpanStartHook> {
        SHARED.clone()
    }
}

/// Trace markers plus the current context attributes; empty outside an
/// observed scope.
pub(crate) fn context_stamp() -> Attributes {
    let mut attributes = context::extract_attributes();
    if !attributes.is_empty() {
        attributes.insert(keys::TRACE.into(), AttributeValue::Bool(true));
        attributes.insert(keys::IN_TRACE.into(), AttributeValue::from("true"));
    }
    attributes
}

impl SpanStartHook for ContextStamper {
    fn on_start(&self, span: &dyn HostSpan) {
        for (key, value) in context_stamp() {
            span.set_attribute(&key, value);
        }
    }
}
