// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Platform resources: prompts and datasets.
//!
//! Each client wraps a transport collaborator ([`PromptApi`], [`DatasetApi`])
//! with a [`ResilientFetch`](crate::cache::ResilientFetch) and runs every
//! read inside a span.

mod api;
mod datasets;
mod prompts;
mod template;

pub use api::{
    Dataset, DatasetApi, DatasetSummary, PromptApi, PromptMessage, PromptRecord, PromptRequest,
};
pub use datasets::{Datasets, DATASETS_TRACER};
pub use prompts::{GetPrompt, Prompt, Prompts, PROMPTS_TRACER};
pub use template::{PlaceholderRenderer, TemplateRenderer};
