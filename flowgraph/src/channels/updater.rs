//! State updater for custom state merge semantics.
//!
//! By default, a node's return value fully replaces the state (`ReplaceUpdater`).
//! A `StateGraph` running parallel fan-out nodes (e.g. one persona per branch)
//! needs per-field merge instead — `FieldBasedUpdater` lets the caller define
//! exactly how each field is combined (append-only lists, per-key maps, etc.).

use std::fmt::Debug;
use std::sync::Arc;

/// Trait for customizing how a node's state update is merged into the running state.
pub trait StateUpdater<S>: Send + Sync + Debug
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Merge `update` (the node's return value) into `current`.
    fn apply_update(&self, current: &mut S, update: &S);
}

/// Default state updater: the node's return value completely replaces the state.
#[derive(Debug, Clone, Default)]
pub struct ReplaceUpdater;

impl<S> StateUpdater<S> for ReplaceUpdater
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn apply_update(&self, current: &mut S, update: &S) {
        *current = update.clone();
    }
}

/// Applies updates field-by-field via a user-supplied function; lets different
/// fields use different merge strategies (replace some, append others).
pub struct FieldBasedUpdater<S, F>
where
    S: Clone + Send + Sync + Debug + 'static,
    F: Fn(&mut S, &S) + Send + Sync + 'static,
{
    updater_fn: F,
    _marker: std::marker::PhantomData<S>,
}

impl<S, F> Debug for FieldBasedUpdater<S, F>
where
    S: Clone + Send + Sync + Debug + 'static,
    F: Fn(&mut S, &S) + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBasedUpdater").finish()
    }
}

impl<S, F> FieldBasedUpdater<S, F>
where
    S: Clone + Send + Sync + Debug + 'static,
    F: Fn(&mut S, &S) + Send + Sync + 'static,
{
    pub fn new(updater_fn: F) -> Self {
        Self {
            updater_fn,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<S, F> StateUpdater<S> for FieldBasedUpdater<S, F>
where
    S: Clone + Send + Sync + Debug + 'static,
    F: Fn(&mut S, &S) + Send + Sync + 'static,
{
    fn apply_update(&self, current: &mut S, update: &S) {
        (self.updater_fn)(current, update);
    }
}

/// Boxed state updater for type erasure in `StateGraph`.
pub type BoxedStateUpdater<S> = Arc<dyn StateUpdater<S>>;
