// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Spans around SDK operations.
//!
//! - [`Observer`] starts spans and runs work inside them
//! - [`SpanHandle`] / [`StartSpanHandle`] are the handles the work receives
//! - [`ContextStamper`] copies the ambient context onto every span a host
//!   tracer starts, and [`ContextLayer`] does the same for `tracing` spans
//!
//! # Usage
//!
//! ```rust,ignore
//! use observe_sdk::span::{ObserveOptions, Observer, ScopedOptions};
//!
//! let answer = observer
//!     .observe(ObserveOptions::new("support-bot", "answer"), |root| async move {
//!         root.set_identity(Some(Identity::new(user_id)), None);
//!         observer
//!             .scoped("support-bot", "retrieve", ScopedOptions::new(), |span| async move {
//!                 span.set_attribute("documents", 3);
//!                 retrieve().await
//!             })
//!             .await
//!     })
//!     .await?;
//! ```

mod handle;
mod layer;
mod observer;
mod stamper;

pub use handle::{Experiment, SpanHandle, StartSpanHandle};
pub use layer::ContextLayer;
pub use observer::{
    ObserveOptions, Observer, ScopedOptions, SdkInfo, DEFAULT_SPAN_KIND, OBSERVE_TRACER,
};
pub use stamper::ContextStamper;
