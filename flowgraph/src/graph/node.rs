//! Graph node trait: one step in a StateGraph.
//!
//! Receives state `S`, returns updated `S` and `Next`. `Node` is the unit
//! `StateGraph::add_node` stores and `CompiledStateGraph::invoke` drives.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::NodeError;

use super::Next;

/// One step in a graph: state in, (state out, next step).
///
/// **Interaction**: Implemented by every graph node (pollers, analyzers, per-persona
/// subgraph wrappers, scheduler, executor). See `StateGraph::add_node` and
/// `CompiledStateGraph::invoke`.
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Node id (e.g. `"emotion_analyzer"`, `"scheduler"`). Must be unique within a graph.
    fn id(&self) -> &str;

    /// One step: state in, (state out, next step).
    ///
    /// Return `Next::Continue` to follow the linear edge order; `Next::Node(id)` to
    /// jump to a node (e.g. the agent subgraph's retry loop); `Next::End` to stop.
    async fn run(&self, state: S) -> Result<(S, Next), NodeError>;
}
