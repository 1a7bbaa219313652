// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The SDK entry point.
//!
//! ```rust,ignore
//! use observe_sdk::Client;
//!
//! let client = Client::builder()
//!     .config(observe_sdk::config::load_config(Path::new("."))?)
//!     .tracer(tracer)
//!     .prompt_api(transport.clone())
//!     .dataset_api(transport.clone())
//!     .trace_sender(transport)
//!     .build()?;
//!
//! let prompt = client.prompts().get(GetPrompt::new("welcome")).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::{Clock, FetchResponse, SystemClock};
use crate::config::{default_config, ResolvedConfig};
use crate::error::{ConfigError, SdkError};
use crate::host::HostTracer;
use crate::instrumentation::{InstallReport, InstrumentationRegistry};
use crate::monitor::{Monitor, TraceRecord, TraceSender};
use crate::resources::{
    Dataset, DatasetApi, DatasetSummary, Datasets, PromptApi, PromptRecord, PromptRequest, Prompts,
};
use crate::span::Observer;

/// Wired SDK: observer, resource clients and trace monitor.
pub struct Client {
    config: ResolvedConfig,
    observer: Observer,
    prompts: Prompts,
    datasets: Datasets,
    monitor: Monitor,
    install_report: InstallReport,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    pub fn datasets(&self) -> &Datasets {
        &self.datasets
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    /// What happened when the registered instrumentations were installed.
    pub fn install_report(&self) -> &InstallReport {
        &self.install_report
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("observer", &self.observer)
            .field("cache_enabled", &self.config.cache_enabled)
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    config: Option<ResolvedConfig>,
    tracer: Option<Arc<dyn HostTracer>>,
    prompt_api: Option<Arc<dyn PromptApi>>,
    dataset_api: Option<Arc<dyn DatasetApi>>,
    trace_sender: Option<Arc<dyn TraceSender>>,
    clock: Option<Arc<dyn Clock>>,
    instrumentations: Option<InstrumentationRegistry>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolved configuration. Defaults to [`default_config`].
    pub fn config(mut self, config: ResolvedConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Host tracer spans are started on. Without one, tracing is a no-op.
    pub fn tracer(mut self, tracer: Arc<dyn HostTracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn prompt_api(mut self, api: Arc<dyn PromptApi>) -> Self {
        self.prompt_api = Some(api);
        self
    }

    pub fn dataset_api(mut self, api: Arc<dyn DatasetApi>) -> Self {
        self.dataset_api = Some(api);
        self
    }

    pub fn trace_sender(mut self, sender: Arc<dyn TraceSender>) -> Self {
        self.trace_sender = Some(sender);
        self
    }

    /// Clock for cache expiry.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Instrumentations to install on the tracer at build time.
    pub fn instrumentations(mut self, registry: InstrumentationRegistry) -> Self {
        self.instrumentations = Some(registry);
        self
    }

    /// Validate the configuration and wire everything together.
    ///
    /// Missing transports are not an error; calls through them fail with
    /// [`SdkError::InvalidArgument`].
    pub fn build(self) -> Result<Client, ConfigError> {
        let config = self.config.unwrap_or_else(default_config);
        config.validate()?;

        let tracer = self.tracer.filter(|_| config.tracing_enabled);
        let install_report = match (&tracer, &self.instrumentations) {
            (Some(tracer), Some(registry)) => registry.install_all(tracer.as_ref()),
            _ => InstallReport::default(),
        };

        let observer = match tracer {
            Some(tracer) => Observer::new(Some(tracer), config.sdk_info()),
            None => Observer::disabled(),
        };

        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let prompt_api: Arc<dyn PromptApi> = match self.prompt_api {
            Some(api) => api,
            None => Arc::new(Unconfigured),
        };
        let dataset_api: Arc<dyn DatasetApi> = match self.dataset_api {
            Some(api) => api,
            None => Arc::new(Unconfigured),
        };
        let trace_sender: Arc<dyn TraceSender> = match self.trace_sender {
            Some(sender) => sender,
            None => Arc::new(Unconfigured),
        };

        let prompts = Prompts::new(prompt_api, observer.clone())
            .with_cache(config.query_ttl, Arc::clone(&clock))
            .with_cache_enabled(config.cache_enabled);

        let datasets = Datasets::new(dataset_api, observer.clone())
            .with_cache(config.query_ttl, clock)
            .with_cache_enabled(config.cache_enabled);

        let monitor = Monitor::new(trace_sender);

        tracing::debug!(
            tracing_enabled = observer.is_enabled(),
            cache_enabled = config.cache_enabled,
            "Client built"
        );

        Ok(Client {
            config,
            observer,
            prompts,
            datasets,
            monitor,
            install_report,
        })
    }
}

/// Stand-in for transports the builder was not given.
struct Unconfigured;

fn unconfigured(what: &str) -> SdkError {
    SdkError::InvalidArgument(format!("no {} transport configured", what))
}

#[async_trait]
impl PromptApi for Unconfigured {
    async fn fetch_prompt(
        &self,
        _request: PromptRequest,
    ) -> Result<FetchResponse<PromptRecord>, SdkError> {
        Err(unconfigured("prompt"))
    }
}

#[async_trait]
impl DatasetApi for Unconfigured {
    async fn fetch_dataset(&self, _slug: String) -> Result<FetchResponse<Dataset>, SdkError> {
        Err(unconfigured("dataset"))
    }

    async fn list_datasets(&self) -> Result<Vec<DatasetSummary>, SdkError> {
        Err(unconfigured("dataset"))
    }
}

#[async_trait]
impl TraceSender for Unconfigured {
    async fn send(&self, _record: TraceRecord) -> Result<(), SdkError> {
        Err(unconfigured("trace"))
    }
}
