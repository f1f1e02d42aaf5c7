//! Node execution error types.
//!
//! Used by `Node::run` and by every node that implements the minimal graph API.

use thiserror::Error;

use crate::graph::GraphInterrupt;

/// Node execution error.
///
/// Returned by `Node::run` when a step fails. Single-node execution; no separate
/// error types for transport or model calls are defined here, every component
/// is expected to fold its own failures into either `ExecutionFailed` or to
/// terminate its own branch and return a normal (non-error) state update instead.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Execution failed with a message (e.g. transport call failed, parse error).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Graph execution was interrupted.
    ///
    /// Raised when a node requests a suspend for human-in-the-loop scenarios. The
    /// executor catches this, saves a checkpoint via the configured `Checkpointer`,
    /// and returns control to the caller; the caller resumes later with
    /// `CompiledStateGraph::resume`.
    #[error("graph interrupted: {0}")]
    Interrupted(GraphInterrupt),
}

impl From<GraphInterrupt> for NodeError {
    fn from(interrupt: GraphInterrupt) -> Self {
        NodeError::Interrupted(interrupt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_error_display_execution_failed() {
        let err = NodeError::ExecutionFailed("boom".to_string());
        let s = err.to_string();
        assert!(s.contains("execution failed"));
        assert!(s.contains("boom"));
    }
}
