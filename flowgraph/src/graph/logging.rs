//! Structured logging helpers for graph execution events.

use std::fmt::Debug;

use crate::error::NodeError;

pub fn log_node_start(node_id: &str) {
    tracing::debug!(node_id, "starting node execution");
}

pub fn log_node_complete(node_id: &str, next: &super::Next) {
    tracing::debug!(node_id, ?next, "node execution complete");
}

pub fn log_state_update(node_id: &str) {
    tracing::debug!(node_id, "state updated");
}

pub fn log_graph_start() {
    tracing::info!("starting graph execution");
}

pub fn log_graph_complete() {
    tracing::info!("graph execution complete");
}

pub fn log_graph_error(error: &NodeError) {
    tracing::error!(error = %error, "graph execution error");
}

#[allow(dead_code)]
fn _assert_debug<S: Debug>() {}
