//! State graph: nodes + explicit edges (from → to) and optional conditional edges.
//!
//! Add nodes with `add_node`, define the chain with `add_edge(from, to)` using
//! `START` and `END` for graph entry/exit. Use `add_conditional_edges` to route
//! to the next node based on state. Then `compile` or `compile_with_checkpointer`
//! to get a `CompiledStateGraph`.
//!
//! # Conditional edges
//!
//! From a source node, a routing function `(state) -> key` is called; the key is
//! used as the next node id, or looked up in an optional path map. A node must have
//! either one outgoing `add_edge` or `add_conditional_edges`, not both.
//!
//! # State updates
//!
//! By default, a node's return value completely replaces the previous state. To
//! customize this (e.g. append to lists, aggregate per-key maps across a parallel
//! fan-out), use `with_state_updater` with a custom `StateUpdater`.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use crate::channels::{BoxedStateUpdater, ReplaceUpdater};
use crate::graph::compile_error::CompilationError;
use crate::graph::compiled::CompiledStateGraph;
use crate::graph::conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
use crate::graph::interrupt::InterruptHandler;
use crate::graph::node::Node;
use crate::graph::node_middleware::NodeMiddleware;
use crate::graph::retry::RetryPolicy;
use crate::memory::Checkpointer;

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to_id` in `add_edge(last_node_id, END)`.
pub const END: &str = "__end__";

/// State graph builder: nodes plus explicit edges and optional conditional edges.
///
/// **Interaction**: Accepts `Arc<dyn Node<S>>`; produces `CompiledStateGraph<S>`.
pub struct StateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: Vec<(String, String)>,
    conditional_edges: HashMap<String, ConditionalRouter<S>>,
    middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    state_updater: Option<BoxedStateUpdater<S>>,
    retry_policy: RetryPolicy,
    interrupt_handler: Option<Arc<dyn InterruptHandler>>,
}

impl<S> Default for StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional_edges: HashMap::new(),
            middleware: None,
            state_updater: None,
            retry_policy: RetryPolicy::None,
            interrupt_handler: None,
        }
    }

    /// Attaches node middleware for fluent API; used by `compile()`.
    pub fn with_middleware(self, middleware: Arc<dyn NodeMiddleware<S>>) -> Self {
        Self {
            middleware: Some(middleware),
            ..self
        }
    }

    /// Attaches a custom state updater controlling how node outputs merge into state.
    pub fn with_state_updater(self, updater: BoxedStateUpdater<S>) -> Self {
        Self {
            state_updater: Some(updater),
            ..self
        }
    }

    /// Attaches a retry policy for node execution. Default is `RetryPolicy::None`.
    pub fn with_retry_policy(self, retry_policy: RetryPolicy) -> Self {
        Self { retry_policy, ..self }
    }

    /// Attaches an interrupt handler for human-in-the-loop scenarios.
    pub fn with_interrupt_handler(self, handler: Arc<dyn InterruptHandler>) -> Self {
        Self {
            interrupt_handler: Some(handler),
            ..self
        }
    }

    /// Adds a node; id must be unique. Replaces if the same id is reused.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds an edge from `from_id` to `to_id`. Use `START`/`END` for entry/exit.
    /// A node may have either one outgoing edge or conditional edges, not both.
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), to_id.into()));
        self
    }

    /// Adds conditional edges from `source`: next node is `path(state)`, optionally
    /// remapped through `path_map`.
    pub fn add_conditional_edges(
        &mut self,
        source: impl Into<String>,
        path: ConditionalRouterFn<S>,
        path_map: Option<HashMap<String, String>>,
    ) -> &mut Self {
        self.conditional_edges
            .insert(source.into(), ConditionalRouter::new(path, path_map));
        self
    }

    /// Builds the executable graph. Validates that edges reference known nodes and
    /// form a single chain from START to END.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        let middleware = self.middleware.clone();
        self.compile_internal(None, middleware)
    }

    /// Builds the executable graph with a checkpointer for suspend/resume persistence.
    pub fn compile_with_checkpointer(
        self,
        checkpointer: Arc<dyn Checkpointer<S>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        let middleware = self.middleware.clone();
        self.compile_internal(Some(checkpointer), middleware)
    }

    fn compile_internal(
        self,
        checkpointer: Option<Arc<dyn Checkpointer<S>>>,
        middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        for (from, to) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(CompilationError::NodeNotFound(from.clone()));
            }
            if to != END && !self.nodes.contains_key(to) {
                return Err(CompilationError::NodeNotFound(to.clone()));
            }
        }
        for (source, router) in &self.conditional_edges {
            if !self.nodes.contains_key(source) {
                return Err(CompilationError::NodeNotFound(source.clone()));
            }
            if let Some(ref path_map) = router.path_map {
                for target in path_map.values() {
                    if target != END && !self.nodes.contains_key(target) {
                        return Err(CompilationError::InvalidConditionalPathMap(target.clone()));
                    }
                }
            }
        }

        let start_edges: Vec<_> = self
            .edges
            .iter()
            .filter(|(f, _)| f == START)
            .map(|(_, t)| t.clone())
            .collect();
        let first = match start_edges.len() {
            0 => return Err(CompilationError::MissingStart),
            1 => start_edges.into_iter().next().unwrap(),
            _ => return Err(CompilationError::InvalidChain("multiple edges from START (branch)".into())),
        };

        let has_end = self.edges.iter().any(|(_, t)| t == END)
            || self
                .conditional_edges
                .values()
                .any(|r| r.path_map.as_ref().map_or(true, |m| m.values().any(|v| v == END)));
        if !has_end {
            return Err(CompilationError::MissingEnd);
        }

        let edge_froms: HashSet<_> = self
            .edges
            .iter()
            .filter(|(f, _)| f.as_str() != START)
            .map(|(f, _)| f.clone())
            .collect();
        if edge_froms.len() != self.edges.iter().filter(|(f, _)| f.as_str() != START).count() {
            return Err(CompilationError::InvalidChain("duplicate from (branch)".into()));
        }
        for source in self.conditional_edges.keys() {
            if edge_froms.contains(source) {
                return Err(CompilationError::NodeHasBothEdgeAndConditional(source.clone()));
            }
        }

        let mut next_map: HashMap<String, NextEntry<S>> = self
            .edges
            .iter()
            .filter(|(f, _)| f.as_str() != START)
            .map(|(f, t)| (f.clone(), NextEntry::Unconditional(t.clone())))
            .collect();
        for (source, router) in &self.conditional_edges {
            next_map.insert(source.clone(), NextEntry::Conditional(router.clone()));
        }

        let mut edge_order = vec![first.clone()];
        if self.conditional_edges.is_empty() {
            let linear_next: HashMap<String, String> = self
                .edges
                .iter()
                .filter(|(f, _)| f.as_str() != START)
                .map(|(f, t)| (f.clone(), t.clone()))
                .collect();
            let mut current = first.clone();
            let mut visited = HashSet::new();
            visited.insert(current.clone());
            loop {
                let next = match linear_next.get(&current) {
                    Some(n) => n.clone(),
                    None => break,
                };
                if next == END {
                    break;
                }
                if visited.contains(&next) {
                    return Err(CompilationError::InvalidChain("cycle detected".into()));
                }
                visited.insert(next.clone());
                edge_order.push(next.clone());
                current = next;
            }
        }

        let state_updater = self.state_updater.unwrap_or_else(|| Arc::new(ReplaceUpdater));

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            first_node_id: first,
            edge_order,
            next_map,
            checkpointer,
            middleware,
            state_updater,
            retry_policy: self.retry_policy,
            interrupt_handler: self.interrupt_handler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::error::NodeError;
    use crate::graph::Next;

    #[derive(Clone, Debug)]
    struct DummyState(i32);

    struct DummyNode(&'static str);

    #[async_trait]
    impl Node<DummyState> for DummyNode {
        fn id(&self) -> &str {
            self.0
        }
        async fn run(&self, state: DummyState) -> Result<(DummyState, Next), NodeError> {
            Ok((state, Next::Continue))
        }
    }

    #[test]
    fn compile_fails_when_node_has_both_edge_and_conditional() {
        let mut graph = StateGraph::<DummyState>::new();
        graph.add_node("a", Arc::new(DummyNode("a")));
        graph.add_node("b", Arc::new(DummyNode("b")));
        graph.add_edge(START, "a");
        graph.add_edge("a", "b");
        graph.add_edge("b", END);
        graph.add_conditional_edges(
            "a",
            Arc::new(|_| "b".to_string()),
            Some([("b".to_string(), "b".to_string())].into_iter().collect()),
        );
        match graph.compile() {
            Err(CompilationError::NodeHasBothEdgeAndConditional(id)) => assert_eq!(id, "a"),
            other => panic!("expected NodeHasBothEdgeAndConditional(a), got {other:?}"),
        }
    }

    #[test]
    fn compile_fails_when_conditional_path_map_has_invalid_target() {
        let mut graph = StateGraph::<DummyState>::new();
        graph.add_node("a", Arc::new(DummyNode("a")));
        graph.add_edge(START, "a");
        graph.add_conditional_edges(
            "a",
            Arc::new(|_| "x".to_string()),
            Some([("x".to_string(), "nonexistent".to_string())].into_iter().collect()),
        );
        match graph.compile() {
            Err(CompilationError::InvalidConditionalPathMap(id)) => assert_eq!(id, "nonexistent"),
            other => panic!("expected InvalidConditionalPathMap(nonexistent), got {other:?}"),
        }
    }

    #[test]
    fn compile_fails_on_missing_start_edge() {
        let mut graph = StateGraph::<DummyState>::new();
        graph.add_node("a", Arc::new(DummyNode("a")));
        graph.add_edge("a", END);
        assert!(matches!(graph.compile(), Err(CompilationError::MissingStart)));
    }

    #[test]
    fn compile_succeeds_for_a_simple_linear_chain() {
        let mut graph = StateGraph::<DummyState>::new();
        graph.add_node("a", Arc::new(DummyNode("a")));
        graph.add_node("b", Arc::new(DummyNode("b")));
        graph.add_edge(START, "a");
        graph.add_edge("a", "b");
        graph.add_edge("b", END);
        assert!(graph.compile().is_ok());
    }
}
