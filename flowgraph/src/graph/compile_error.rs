//! Compilation errors for `StateGraph::compile`.

use thiserror::Error;

/// Errors raised while compiling a `StateGraph` into a `CompiledStateGraph`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompilationError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("conditional path_map references unknown node: {0}")]
    InvalidConditionalPathMap(String),

    #[error("graph has no edge from START")]
    MissingStart,

    #[error("graph never reaches END")]
    MissingEnd,

    #[error("invalid chain: {0}")]
    InvalidChain(String),

    #[error("node has both an outgoing edge and conditional edges: {0}")]
    NodeHasBothEdgeAndConditional(String),
}
