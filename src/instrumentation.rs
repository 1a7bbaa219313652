// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Registry of optional instrumentations.
//!
//! An instrumentation hooks a third-party library (an LLM client, a vector
//! store) into the host tracer. The registry is built once at startup and
//! passed to whatever installs it:
//!
//! ```rust,ignore
//! use observe_sdk::instrumentation::InstrumentationRegistryBuilder;
//!
//! let mut builder = InstrumentationRegistryBuilder::new();
//! builder.register(OpenAiInstrumentation::default());
//! let registry = builder.build();
//!
//! let report = registry.install_all(tracer.as_ref());
//! ```
//!
//! An instrumentation whose library is not available reports
//! [`InstrumentationError::MissingDependency`]; that is logged and skipped.

use std::sync::Arc;

use crate::error::InstrumentationError;
use crate::host::{HostTracer, SpanStartHook};

/// A pluggable integration with the host tracer.
pub trait Instrumentation: Send + Sync {
    /// Unique name. Registering a second instrumentation with the same name
    /// replaces the first.
    fn name(&self) -> &str;

    /// Wire the integration into `tracer`.
    fn install(&self, tracer: &dyn HostTracer) -> Result<(), InstrumentationError>;
}

/// Instrumentation that registers a span start hook.
pub struct HookInstrumentation {
    name: String,
    hook: Arc<dyn SpanStartHook>,
}

impl HookInstrumentation {
    pub fn new(name: impl Into<String>, hook: Arc<dyn SpanStartHook>) -> Self {
        Self {
            name: name.into(),
            hook,
        }
    }
}

impl Instrumentation for HookInstrumentation {
    fn name(&self) -> &str {
        &self.name
    }

    fn install(&self, tracer: &dyn HostTracer) -> Result<(), InstrumentationError> {
        tracer.register_span_start_hook(Arc::clone(&self.hook));
        Ok(())
    }
}

/// Outcome of [`InstrumentationRegistry::install_all`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Names that installed successfully.
    pub installed: Vec<String>,
    /// Names skipped because an optional dependency is missing.
    pub skipped: Vec<String>,
    /// Names that failed, with the error.
    pub failed: Vec<(String, InstrumentationError)>,
}

impl InstallReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Instrumentations in registration order.
pub struct InstrumentationRegistry {
    instrumentations: Vec<Arc<dyn Instrumentation>>,
}

impl InstrumentationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            instrumentations: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Instrumentation>> {
        self.instrumentations
            .iter()
            .find(|i| i.name() == name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.instrumentations.iter().map(|i| i.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.instrumentations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrumentations.is_empty()
    }

    /// Install every instrumentation into `tracer`, in registration order.
    ///
    /// Never fails: each outcome is logged and collected in the report.
    pub fn install_all(&self, tracer: &dyn HostTracer) -> InstallReport {
        let mut report = InstallReport::default();

        for instrumentation in &self.instrumentations {
            let name = instrumentation.name().to_string();
            match instrumentation.install(tracer) {
                Ok(()) => {
                    tracing::debug!(instrumentation = %name, "Instrumentation installed");
                    report.installed.push(name);
                }
                Err(err) if err.is_missing_dependency() => {
                    tracing::warn!(instrumentation = %name, "Skipping instrumentation: {}", err);
                    report.skipped.push(name);
                }
                Err(err) => {
                    tracing::error!(instrumentation = %name, "Instrumentation failed: {}", err);
                    report.failed.push((name, err));
                }
            }
        }

        report
    }
}

impl Default for InstrumentationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing an [`InstrumentationRegistry`].
pub struct InstrumentationRegistryBuilder {
    instrumentations: Vec<Arc<dyn Instrumentation>>,
}

impl InstrumentationRegistryBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self {
            instrumentations: Vec::new(),
        }
    }

    /// Register an instrumentation.
    pub fn register<T: Instrumentation + 'static>(&mut self, instrumentation: T) -> &mut Self {
        self.register_arc(Arc::new(instrumentation))
    }

    /// Register a shared instrumentation.
    pub fn register_arc(&mut self, instrumentation: Arc<dyn Instrumentation>) -> &mut Self {
        match self
            .instrumentations
            .iter()
            .position(|i| i.name() == instrumentation.name())
        {
            Some(index) => self.instrumentations[index] = instrumentation,
            None => self.instrumentations.push(instrumentation),
        }
        self
    }

    /// Build the final registry.
    pub fn build(self) -> InstrumentationRegistry {
        InstrumentationRegistry {
            instrumentations: self.instrumentations,
        }
    }
}

impl Default for InstrumentationRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostSpan, InMemoryTracer, SpanOptions};

    struct MockInstrumentation {
        name: String,
        outcome: Result<(), InstrumentationError>,
    }

    impl MockInstrumentation {
        fn ok(name: &str) -> Self {
            Self {
                name: name.to_string(),
                outcome: Ok(()),
            }
        }

        fn failing(name: &str, err: InstrumentationError) -> Self {
            Self {
                name: name.to_string(),
                outcome: Err(err),
            }
        }
    }

    impl Instrumentation for MockInstrumentation {
        fn name(&self) -> &str {
            &self.name
        }

        fn install(&self, _tracer: &dyn HostTracer) -> Result<(), InstrumentationError> {
            self.outcome.clone()
        }
    }

    struct Marker;

    impl SpanStartHook for Marker {
        fn on_start(&self, span: &dyn HostSpan) {
            span.set_attribute("marked", true.into());
        }
    }

    #[test]
    fn test_install_all_report() {
        let mut builder = InstrumentationRegistryBuilder::new();
        builder
            .register(MockInstrumentation::ok("openai"))
            .register(MockInstrumentation::failing(
                "anthropic",
                InstrumentationError::missing("anthropic", "anthropic-sdk"),
            ))
            .register(MockInstrumentation::failing(
                "qdrant",
                InstrumentationError::InstallFailed {
                    instrumentation: "qdrant".to_string(),
                    message: "incompatible version".to_string(),
                },
            ));
        let registry = builder.build();

        let report = registry.install_all(&InMemoryTracer::new());
        assert_eq!(report.installed, vec!["openai".to_string()]);
        assert_eq!(report.skipped, vec!["anthropic".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut builder = InstrumentationRegistryBuilder::new();
        builder.register(MockInstrumentation::ok("openai"));
        builder.register(MockInstrumentation::ok("cohere"));
        builder.register(MockInstrumentation::failing(
            "openai",
            InstrumentationError::missing("openai", "async-openai"),
        ));
        let registry = builder.build();

        assert_eq!(registry.names(), vec!["openai", "cohere"]);
        let report = registry.install_all(&InMemoryTracer::new());
        assert_eq!(report.skipped, vec!["openai".to_string()]);
        assert!(report.is_clean());
    }

    #[test]
    fn test_hook_instrumentation_registers_hook() {
        let tracer = InMemoryTracer::new();
        let mut builder = InstrumentationRegistryBuilder::new();
        builder.register(HookInstrumentation::new("marker", Arc::new(Marker)));
        let registry = builder.build();
        assert!(registry.contains("marker"));

        registry.install_all(&tracer);
        tracer.start_span("work", SpanOptions::new("tests")).end();

        let span = tracer.span_named("work").unwrap();
        assert_eq!(span.attribute("marked").and_then(|v| v.as_bool()), Some(true));
    }
}
