//! Minimal state graphs in Rust: nodes + edges, conditional routing, checkpointing
//! and interrupts.
//!
//! Build a graph with [`graph::StateGraph`], compile it (optionally with a
//! [`memory::Checkpointer`]) into a [`graph::CompiledStateGraph`], then drive it
//! with `invoke`. A node can interrupt execution (e.g. to wait on a human
//! decision); the compiled graph checkpoints state at that point and the caller
//! resumes later with `CompiledStateGraph::resume`.

pub mod channels;
pub mod error;
pub mod graph;
pub mod memory;

pub use error::NodeError;
