// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Task-local storage for the ambient observation state.
//!
//! The state lives in a tokio task-local slot, so each task sees its own
//! value and a scope always restores the enclosing value when it exits,
//! whether the inner work returned, failed or panicked. Code running outside
//! any scope sees the empty state and runs unchanged.

use std::future::Future;
use std::sync::Arc;

use crate::attributes::Attributes;
use crate::host::SpanId;
use crate::span::StartSpanHandle;

use super::types::ObservationContext;

/// Everything carried implicitly through one call chain.
#[derive(Clone, Default)]
pub(crate) struct Ambient {
    pub(crate) context: Arc<ObservationContext>,
    pub(crate) active_span: Option<SpanId>,
    pub(crate) root_span: Option<StartSpanHandle>,
}

tokio::task_local! {
    static AMBIENT: Ambient;
}

pub(crate) fn ambient() -> Ambient {
    AMBIENT.try_with(Ambient::clone).unwrap_or_default()
}

/// A captured ambient state that can be installed around other work.
///
/// Returned by [`set`] and [`current_scope`]. Use it to carry the current
/// context into a spawned task:
///
/// ```rust,ignore
/// let scope = observe_sdk::context::current_scope();
/// tokio::spawn(scope.run(async move { /* sees the parent context */ }));
/// ```
#[derive(Clone, Default)]
pub struct ObservationScope {
    ambient: Ambient,
}

impl ObservationScope {
    pub(crate) fn from_ambient(ambient: Ambient) -> Self {
        Self { ambient }
    }

    /// The observation context this scope installs.
    pub fn context(&self) -> &ObservationContext {
        &self.ambient.context
    }

    /// Run `future` with this scope installed.
    pub async fn run<F: Future>(self, future: F) -> F::Output {
        AMBIENT.scope(self.ambient, future).await
    }

    /// Run `f` with this scope installed.
    pub fn run_sync<R>(self, f: impl FnOnce() -> R) -> R {
        AMBIENT.sync_scope(self.ambient, f)
    }
}

/// The observation context of the current scope, or an empty one.
pub fn current() -> Arc<ObservationContext> {
    AMBIENT
        .try_with(|ambient| Arc::clone(&ambient.context))
        .unwrap_or_default()
}

/// Capture the current scope unchanged.
pub fn current_scope() -> ObservationScope {
    ObservationScope::from_ambient(ambient())
}

/// Build a scope whose context is exactly `context`.
///
/// Active and root spans are carried over from the current scope.
pub fn set(context: ObservationContext) -> ObservationScope {
    let mut ambient = ambient();
    ambient.context = Arc::new(context);
    ObservationScope::from_ambient(ambient)
}

/// Run `future` under `context`, replacing (not merging) the current one.
pub async fn with_context<F: Future>(context: ObservationContext, future: F) -> F::Output {
    set(context).run(future).await
}

/// Synchronous variant of [`with_context`].
pub fn with_context_sync<R>(context: ObservationContext, f: impl FnOnce() -> R) -> R {
    set(context).run_sync(f)
}

/// Run `future` under the current context merged with `partial`.
pub async fn with_merged_context<F: Future>(partial: ObservationContext, future: F) -> F::Output {
    let merged = current().merge(&partial);
    set(merged).run(future).await
}

/// Synchronous variant of [`with_merged_context`].
pub fn with_merged_context_sync<R>(partial: ObservationContext, f: impl FnOnce() -> R) -> R {
    let merged = current().merge(&partial);
    set(merged).run_sync(f)
}

/// Attributes of the current context. Empty outside any scope.
pub fn extract_attributes() -> Attributes {
    current().to_attributes()
}

/// The span new spans in this scope should be parented to.
pub fn active_span_id() -> Option<SpanId> {
    AMBIENT.try_with(|ambient| ambient.active_span).ok().flatten()
}

/// The innermost active root span, if any.
pub fn root_span() -> Option<StartSpanHandle> {
    AMBIENT
        .try_with(|ambient| ambient.root_span.clone())
        .ok()
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Identity;

    #[test]
    fn test_outside_scope_is_empty() {
        assert!(current().is_empty());
        assert!(extract_attributes().is_empty());
        assert!(active_span_id().is_none());
        assert!(root_span().is_none());
    }

    #[test]
    fn test_with_context_replaces() {
        let outer = ObservationContext::new().with_feature_slug("outer");
        let inner = ObservationContext::new().with_experiment_id("exp");

        with_context_sync(outer, || {
            with_context_sync(inner.clone(), || {
                assert_eq!(*current(), inner);
            });
            assert_eq!(current().feature_slug.as_deref(), Some("outer"));
        });
        assert!(current().is_empty());
    }

    #[test]
    fn test_merged_context_restores_parent() {
        let base = ObservationContext::new().with_evaluators(["quality", "safety"]);
        with_context_sync(base.clone(), || {
            let before = current();
            with_merged_context_sync(
                ObservationContext::new().with_evaluators(["toxicity", "bias"]),
                || {
                    assert_eq!(
                        current().evaluators.clone().unwrap(),
                        vec!["quality", "safety", "toxicity", "bias"]
                    );
                },
            );
            assert_eq!(current(), before);
        });
    }

    #[test]
    fn test_scope_restored_after_panic() {
        with_context_sync(ObservationContext::new().with_feature_slug("outer"), || {
            let result = std::panic::catch_unwind(|| {
                with_merged_context_sync(ObservationContext::new().with_feature_slug("inner"), || {
                    panic!("boom");
                })
            });
            assert!(result.is_err());
            assert_eq!(current().feature_slug.as_deref(), Some("outer"));
        });
    }

    #[tokio::test]
    async fn test_async_scope_restored_after_error() {
        let outer = ObservationContext::new().with_user(Identity::new("u1"));
        with_context(outer.clone(), async {
            let result: Result<(), &str> = with_merged_context(
                ObservationContext::new().with_feature_slug("inner"),
                async {
                    tokio::task::yield_now().await;
                    assert_eq!(current().feature_slug.as_deref(), Some("inner"));
                    Err("failed")
                },
            )
            .await;
            assert!(result.is_err());
            assert_eq!(*current(), outer);
        })
        .await;
    }

    #[tokio::test]
    async fn test_spawned_task_does_not_inherit() {
        with_context(ObservationContext::new().with_feature_slug("parent"), async {
            let plain = tokio::spawn(async { current().is_empty() }).await.unwrap();
            assert!(plain);

            let forked = tokio::spawn(current_scope().run(async {
                current().feature_slug.clone()
            }))
            .await
            .unwrap();
            assert_eq!(forked.as_deref(), Some("parent"));
        })
        .await;
    }

    #[tokio::test]
    async fn test_concurrent_chains_are_isolated() {
        let a = with_context(ObservationContext::new().with_feature_slug("a"), async {
            tokio::task::yield_now().await;
            current().feature_slug.clone()
        });
        let b = with_context(ObservationContext::new().with_feature_slug("b"), async {
            tokio::task::yield_now().await;
            current().feature_slug.clone()
        });
        let (a, b) = tokio::join!(a, b);
        assert_eq!(a.as_deref(), Some("a"));
        assert_eq!(b.as_deref(), Some("b"));
    }
}
