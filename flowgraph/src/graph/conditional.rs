//! Conditional edges: route to the next node based on state.
//!
//! From a source node, a routing function `(state) -> key` is called after the node
//! runs; the key is either used directly as the next node id, or looked up in an
//! optional path map.
//!
//! **Interaction**: Used by `StateGraph::add_conditional_edges` and the
//! `CompiledStateGraph` run loop to resolve the next node after a node with
//! conditional edges runs.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Router function: takes a reference to state and returns a routing key.
pub type ConditionalRouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Conditional edge definition: routing function plus optional path map.
///
/// - When `path_map` is `None`, the router's return value is used directly as the next node id.
/// - When `path_map` is `Some(map)`, the router's return value is used as the key;
///   the next node id is `map[key]` if present, otherwise the key itself (allowing
///   direct node ids as keys).
#[derive(Clone)]
pub struct ConditionalRouter<S> {
    pub(super) path: ConditionalRouterFn<S>,
    pub(super) path_map: Option<HashMap<String, String>>,
}

impl<S> ConditionalRouter<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Builds a conditional router with an optional path map.
    pub fn new(path: ConditionalRouterFn<S>, path_map: Option<HashMap<String, String>>) -> Self {
        Self { path, path_map }
    }

    /// Resolves the next node id from the current state.
    pub fn resolve_next(&self, state: &S) -> String {
        let key = (self.path)(state);
        self.path_map
            .as_ref()
            .and_then(|m| m.get(&key))
            .cloned()
            .unwrap_or(key)
    }
}

/// How to determine the next node after a given node runs.
#[derive(Clone)]
pub enum NextEntry<S> {
    /// Single fixed next node (or END). Node's `Next` (Continue/Node/End) is still respected.
    Unconditional(String),
    /// Next node is decided by the router from state; the node's `Next` is ignored
    /// unless the router itself returns `END`.
    Conditional(ConditionalRouter<S>),
}
