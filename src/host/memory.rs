// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-process tracer that keeps finished spans in memory.
//!
//! Useful for tests and for applications that want to inspect what the SDK
//! recorded without running an exporter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};

use super::{HostSpan, HostTracer, SpanId, SpanOptions, SpanStartHook, SpanStatus};
use crate::attributes::{AttributeValue, Attributes};

/// Event recorded on a span.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanEvent {
    pub name: String,
    pub attributes: Attributes,
}

/// Snapshot of a span after it ended.
#[derive(Debug, Clone)]
pub struct FinishedSpan {
    pub id: SpanId,
    pub name: String,
    pub tracer_name: String,
    pub parent: Option<SpanId>,
    pub attributes: Attributes,
    pub status: SpanStatus,
    pub events: Vec<SpanEvent>,
    pub exceptions: Vec<String>,
    pub duration: Duration,
}

impl FinishedSpan {
    /// Look up an attribute by key.
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Look up a string attribute by key.
    pub fn str_attribute(&self, key: &str) -> Option<&str> {
        self.attribute(key).and_then(AttributeValue::as_str)
    }
}

#[derive(Default)]
struct Shared {
    hooks: RwLock<Vec<Arc<dyn SpanStartHook>>>,
    finished: Mutex<Vec<FinishedSpan>>,
    started: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

struct SpanState {
    attributes: Attributes,
    status: SpanStatus,
    events: Vec<SpanEvent>,
    exceptions: Vec<String>,
    ended: bool,
}

struct MemorySpan {
    id: SpanId,
    name: String,
    tracer_name: String,
    parent: Option<SpanId>,
    started_at: Instant,
    state: Mutex<SpanState>,
    shared: Arc<Shared>,
}

impl HostSpan for MemorySpan {
    fn id(&self) -> SpanId {
        self.id
    }

    fn set_attribute(&self, key: &str, value: AttributeValue) {
        let mut state = lock(&self.state);
        if !state.ended {
            state.attributes.insert(key.to_string(), value);
        }
    }

    fn set_status(&self, status: SpanStatus) {
        let mut state = lock(&self.state);
        if !state.ended {
            state.status = status;
        }
    }

    fn add_event(&self, name: &str, attributes: Attributes) {
        let mut state = lock(&self.state);
        if !state.ended {
            state.events.push(SpanEvent {
                name: name.to_string(),
                attributes,
            });
        }
    }

    fn record_exception(&self, message: &str) {
        let mut state = lock(&self.state);
        if !state.ended {
            state.exceptions.push(message.to_string());
        }
    }

    fn end(&self) {
        let finished = {
            let mut state = lock(&self.state);
            if state.ended {
                return;
            }
            state.ended = true;
            FinishedSpan {
                id: self.id,
                name: self.name.clone(),
                tracer_name: self.tracer_name.clone(),
                parent: self.parent,
                attributes: state.attributes.clone(),
                status: state.status.clone(),
                events: state.events.clone(),
                exceptions: state.exceptions.clone(),
                duration: self.started_at.elapsed(),
            }
        };

        let hooks = self.shared.hooks.read().map(|h| h.clone()).unwrap_or_default();
        for hook in hooks {
            hook.on_end(self);
        }

        lock(&self.shared.finished).push(finished);
    }

    fn is_recording(&self) -> bool {
        !lock(&self.state).ended
    }
}

/// Tracer that records every finished span.
#[derive(Clone, Default)]
pub struct InMemoryTracer {
    shared: Arc<Shared>,
}

impl InMemoryTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All spans that have ended, in end order.
    pub fn finished_spans(&self) -> Vec<FinishedSpan> {
        lock(&self.shared.finished).clone()
    }

    /// Finished spans with the given name.
    pub fn spans_named(&self, name: &str) -> Vec<FinishedSpan> {
        lock(&self.shared.finished)
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect()
    }

    /// The first finished span with the given name.
    pub fn span_named(&self, name: &str) -> Option<FinishedSpan> {
        self.spans_named(name).into_iter().next()
    }

    /// Number of spans started so far.
    pub fn started_count(&self) -> usize {
        self.shared.started.load(Ordering::SeqCst)
    }

    /// Number of spans started but not yet ended.
    pub fn open_count(&self) -> usize {
        self.started_count()
            .saturating_sub(lock(&self.shared.finished).len())
    }

    /// Number of registered hooks.
    pub fn hook_count(&self) -> usize {
        self.shared.hooks.read().map(|h| h.len()).unwrap_or_default()
    }

    /// Forget all finished spans. Registered hooks are kept.
    pub fn reset(&self) {
        lock(&self.shared.finished).clear();
        self.shared.started.store(0, Ordering::SeqCst);
    }
}

impl HostTracer for InMemoryTracer {
    fn start_span(&self, name: &str, options: SpanOptions) -> Arc<dyn HostSpan> {
        self.shared.started.fetch_add(1, Ordering::SeqCst);

        let span = Arc::new(MemorySpan {
            id: SpanId::new(),
            name: name.to_string(),
            tracer_name: options.tracer_name,
            parent: options.parent,
            started_at: Instant::now(),
            state: Mutex::new(SpanState {
                attributes: Attributes::new(),
                status: SpanStatus::Unset,
                events: Vec::new(),
                exceptions: Vec::new(),
                ended: false,
            }),
            shared: Arc::clone(&self.shared),
        });

        let hooks = self.shared.hooks.read().map(|h| h.clone()).unwrap_or_default();
        for hook in hooks {
            hook.on_start(span.as_ref());
        }

        for (key, value) in options.attributes {
            span.set_attribute(&key, value);
        }

        span
    }

    fn register_span_start_hook(&self, hook: Arc<dyn SpanStartHook>) {
        if let Ok(mut hooks) = self.shared.hooks.write() {
            if !hooks.iter().any(|h| Arc::ptr_eq(h, &hook)) {
                hooks.push(hook);
            }
        }
    }
}
