// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Ambient observation context.
//!
//! An [`ObservationContext`] describes *who* and *what* an operation is for:
//! identity, experiment, feature, metadata, evaluators and the prompts in use.
//! It is installed for a dynamic scope and read implicitly by everything
//! running inside it, including spans started by other libraries.
//!
//! ```rust,ignore
//! use observe_sdk::context::{self, ObservationContext};
//!
//! let ctx = ObservationContext::new()
//!     .with_feature_slug("support-bot")
//!     .with_evaluators(["helpfulness"]);
//!
//! context::with_merged_context(ctx, async {
//!     // every span started here carries the context attributes
//! })
//! .await;
//! ```

mod extract;
mod merge;
mod store;
mod types;

pub(crate) use store::{ambient, Ambient};
pub use store::{
    active_span_id, current, current_scope, extract_attributes, root_span, set, with_context,
    with_context_sync, with_merged_context, with_merged_context_sync, ObservationScope,
};
pub use types::{
    EvaluationConfig, Identity, ObservationContext, PromptMetadata, PromptModel, UNKNOWN_MODEL,
};
