//! Multi-persona conversational agent supervisor.
//!
//! Wires a `flowgraph::StateGraph<SupervisorState>` (see [`supervisor_graph`]) that
//! polls a group chat, analyzes emotion and personality, fans out to one
//! `flowgraph::StateGraph<AgentState>` per persona (see [`agent_graph`]), schedules
//! and optionally human-approves the resulting actions, then dispatches them. The
//! binary entrypoint (`main.rs`) owns the run loop; everything else here is a
//! library so it can be exercised directly by tests.

pub mod agent_graph;
pub mod domain;
pub mod emotion;
pub mod errors;
pub mod executor;
pub mod format;
pub mod human_approval;
pub mod identity;
pub mod llm;
pub mod logging;
pub mod memory;
pub mod personality;
pub mod poller;
pub mod prompts;
pub mod scheduler;
pub mod settings;
pub mod supervisor_graph;
pub mod time;
pub mod transport;
