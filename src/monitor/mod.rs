// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Trace reporting.
//!
//! A [`Monitor`] starts [`Trace`]s that pick up identity, metadata and
//! evaluators from the ambient observation context and are delivered through
//! a [`TraceSender`] when ended.

mod trace;

use std::sync::Arc;

use serde_json::Value;

use crate::context;

pub use trace::{FlushHandle, Trace, TraceRecord, TraceSender};

/// Arguments for [`Monitor::start`].
#[derive(Debug, Clone, Default)]
pub struct StartTrace {
    pub feature_slug: String,
    pub name: Option<String>,
    pub input: Option<Value>,
}

impl StartTrace {
    pub fn new(feature_slug: impl Into<String>) -> Self {
        Self {
            feature_slug: feature_slug.into(),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn input(mut self, input: impl Into<Value>) -> Self {
        self.input = Some(input.into());
        self
    }
}

/// Starts traces bound to one sender.
#[derive(Clone)]
pub struct Monitor {
    sender: Arc<dyn TraceSender>,
}

impl Monitor {
    pub fn new(sender: Arc<dyn TraceSender>) -> Self {
        Self { sender }
    }

    /// Start a trace. The ambient context supplies identity, metadata and
    /// evaluators; an empty feature slug falls back to the context's.
    pub fn start(&self, options: StartTrace) -> Trace {
        let ctx = context::current();

        let feature_slug = if options.feature_slug.trim().is_empty() {
            ctx.feature_slug.clone().unwrap_or_default()
        } else {
            options.feature_slug
        };
        if feature_slug.trim().is_empty() {
            tracing::warn!("Trace started without a feature slug");
        }

        let mut record = TraceRecord::new(feature_slug);
        record.name = options.name;
        record.input = options.input;
        record.user = ctx.user.clone();
        record.organization = ctx.organization.clone();
        record.metadata = ctx.metadata.clone().unwrap_or_default();
        record.evaluators = ctx.evaluators.clone().unwrap_or_default();

        tracing::debug!(trace_id = %record.id, feature_slug = %record.feature_slug, "Trace started");
        Trace::new(Arc::clone(&self.sender), record)
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Identity, ObservationContext};
    use crate::error::SdkError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        records: Mutex<Vec<TraceRecord>>,
    }

    #[async_trait]
    impl TraceSender for RecordingSender {
        async fn send(&self, record: TraceRecord) -> Result<(), SdkError> {
            self.records.lock().unwrap().push(record);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_start_reads_ambient_context() {
        let sender = Arc::new(RecordingSender::default());
        let monitor = Monitor::new(sender.clone());

        let ctx = ObservationContext::new()
            .with_user(Identity::new("user-1"))
            .with_metadata("channel", "web")
            .with_evaluators(["quality"]);

        let trace = context::with_context(ctx, async {
            monitor.start(StartTrace::new("support-bot").name("answer").input("hi"))
        })
        .await;

        trace.end(Some(json!("hello"))).unwrap().wait().await;

        let records = sender.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.feature_slug, "support-bot");
        assert_eq!(record.user.as_ref().and_then(|u| u.id.as_deref()), Some("user-1"));
        assert_eq!(record.metadata["channel"], json!("web"));
        assert_eq!(record.evaluators, vec!["quality".to_string()]);
        assert_eq!(record.output, Some(json!("hello")));
    }

    #[tokio::test]
    async fn test_feature_slug_from_context() {
        let monitor = Monitor::new(Arc::new(RecordingSender::default()));
        let ctx = ObservationContext::new().with_feature_slug("search");

        let trace = context::with_context(ctx, async { monitor.start(StartTrace::new("")) }).await;
        assert_eq!(trace.record().feature_slug, "search");
    }
}
