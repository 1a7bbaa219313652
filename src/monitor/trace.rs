// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Traces reported to the platform and their flush lifecycle.
//!
//! A trace is ended once. Ending starts a flush; at most one flush per trace
//! is in flight at a time, and a failed flush leaves the trace ended so it can
//! simply be flushed again.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::context::Identity;
use crate::error::SdkError;
use crate::host::TraceId;

/// The data sent for one trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRecord {
    pub id: TraceId,
    pub feature_slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<Identity>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evaluators: Vec<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl TraceRecord {
    pub fn new(feature_slug: impl Into<String>) -> Self {
        Self {
            id: TraceId::new(),
            feature_slug: feature_slug.into(),
            name: None,
            input: None,
            output: None,
            user: None,
            organization: None,
            metadata: Map::new(),
            evaluators: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
        }
    }
}

/// Delivers trace records to the platform.
#[async_trait]
pub trait TraceSender: Send + Sync {
    async fn send(&self, record: TraceRecord) -> Result<(), SdkError>;
}

/// A flush started by [`Trace::flush`] or [`Trace::end`].
///
/// Every caller that asks for a flush while one is running receives a handle
/// to that same send.
#[derive(Debug, Clone)]
pub struct FlushHandle {
    done: watch::Receiver<bool>,
    joined: bool,
}

impl FlushHandle {
    /// Wait for the send to complete. Send failures are logged, not returned.
    pub async fn wait(mut self) {
        // A closed channel means the task is gone; nothing left to wait for.
        let _ = self.done.wait_for(|done| *done).await;
    }

    pub fn is_finished(&self) -> bool {
        *self.done.borrow()
    }

    /// Whether this handle joined a send that was already in flight.
    pub fn is_joined(&self) -> bool {
        self.joined
    }
}

/// Re-arms the trace when the send task finishes, including by panic or
/// cancellation.
struct Rearm {
    inner: Arc<TraceInner>,
    done: watch::Sender<bool>,
}

impl Drop for Rearm {
    fn drop(&mut self) {
        if std::thread::panicking() {
            tracing::warn!("Trace sender panicked, flush abandoned");
        }
        self.inner.lock().in_flight = None;
        self.done.send_replace(true);
    }
}

struct TraceState {
    record: TraceRecord,
    ended: bool,
    in_flight: Option<watch::Receiver<bool>>,
}

struct TraceInner {
    sender: Arc<dyn TraceSender>,
    state: Mutex<TraceState>,
}

impl TraceInner {
    fn lock(&self) -> MutexGuard<'_, TraceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A trace being recorded. Clones refer to the same trace.
#[derive(Clone)]
pub struct Trace {
    inner: Arc<TraceInner>,
}

impl Trace {
    pub(crate) fn new(sender: Arc<dyn TraceSender>, record: TraceRecord) -> Self {
        Self {
            inner: Arc::new(TraceInner {
                sender,
                state: Mutex::new(TraceState {
                    record,
                    ended: false,
                    in_flight: None,
                }),
            }),
        }
    }

    pub fn id(&self) -> TraceId {
        self.inner.lock().record.id
    }

    /// Copy of the current record.
    pub fn record(&self) -> TraceRecord {
        self.inner.lock().record.clone()
    }

    pub fn set_input(&self, input: impl Into<Value>) {
        self.inner.lock().record.input = Some(input.into());
    }

    pub fn set_metadata(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner
            .lock()
            .record
            .metadata
            .insert(key.into(), value.into());
    }

    pub fn add_evaluator(&self, evaluator: impl Into<String>) {
        let evaluator = evaluator.into();
        let mut state = self.inner.lock();
        if !state.record.evaluators.contains(&evaluator) {
            state.record.evaluators.push(evaluator);
        }
    }

    pub fn is_ended(&self) -> bool {
        self.inner.lock().ended
    }

    pub fn is_flushing(&self) -> bool {
        self.inner.lock().in_flight.is_some()
    }

    /// End the trace with `output` and start a flush.
    ///
    /// Ending twice logs a warning and changes nothing. Returns the flush
    /// that was started, if any.
    pub fn end(&self, output: Option<Value>) -> Option<FlushHandle> {
        {
            let mut state = self.inner.lock();
            if state.ended {
                tracing::warn!(trace_id = %state.record.id, "Trace already ended");
                return None;
            }
            state.ended = true;
            state.record.output = output;
            state.record.end_time = Some(Utc::now());
        }
        self.flush()
    }

    /// Send the trace unless a send is already in flight.
    ///
    /// A call made while a send is running starts nothing and returns a
    /// handle joined to that send. Returns `None` when no tokio runtime is
    /// available.
    pub fn flush(&self) -> Option<FlushHandle> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!(
                    trace_id = %self.id(),
                    "No async runtime available, trace not flushed"
                );
                return None;
            }
        };

        let (record, done_tx, done_rx) = {
            let mut state = self.inner.lock();
            if let Some(done) = &state.in_flight {
                tracing::debug!(trace_id = %state.record.id, "Flush already in flight");
                return Some(FlushHandle {
                    done: done.clone(),
                    joined: true,
                });
            }
            let (done_tx, done_rx) = watch::channel(false);
            state.in_flight = Some(done_rx.clone());
            (state.record.clone(), done_tx, done_rx)
        };

        let rearm = Rearm {
            inner: Arc::clone(&self.inner),
            done: done_tx,
        };
        runtime.spawn(async move {
            let trace_id = record.id;
            let result = rearm.inner.sender.send(record).await;
            match result {
                Ok(()) => tracing::debug!(%trace_id, "Trace flushed"),
                Err(e) => tracing::warn!(%trace_id, "Failed to flush trace: {}", e),
            }
            drop(rearm);
        });

        Some(FlushHandle {
            done: done_rx,
            joined: false,
        })
    }
}

impl std::fmt::Debug for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("Trace")
            .field("id", &state.record.id)
            .field("feature_slug", &state.record.feature_slug)
            .field("ended", &state.ended)
            .field("in_flight", &state.in_flight.is_some())
            .finish()
    }
}
