//! Error types for each collaborator boundary, aggregated into one top-level error
//! the run loop can match on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),
    #[error("transport returned error status {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Request(String),
    #[error("llm response was not valid JSON: {0}")]
    InvalidJson(String),
    #[error("llm call timed out")]
    Timeout,
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("record not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    Graph(#[from] flowgraph::NodeError),
    #[error("graph compilation failed: {0}")]
    Compile(#[from] flowgraph::graph::CompilationError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    ConfigLoad(#[from] config::LoadError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
