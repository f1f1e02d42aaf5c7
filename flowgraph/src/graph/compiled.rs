//! Compiled state graph: immutable, runs via `invoke` and `resume`.
//!
//! Built by `StateGraph::compile` or `compile_with_checkpointer`. Holds nodes and
//! edge order (derived from explicit edges at compile time), plus an optional
//! checkpointer. When a checkpointer is set and `config.thread_id` is provided, a
//! checkpoint is saved whenever a node interrupts, so a later call to `resume` can
//! pick the run back up from the node after the interrupt.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::channels::BoxedStateUpdater;
use crate::error::NodeError;
use crate::memory::{Checkpoint, CheckpointMetadata, CheckpointSource, Checkpointer, RunnableConfig};

use super::interrupt::InterruptHandler;
use super::logging::{log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start, log_state_update};
use super::node_middleware::NodeMiddleware;
use super::retry::RetryPolicy;
use super::state_graph::END;
use super::{Next, NextEntry, Node};

/// Compiled graph: immutable structure, runs from `first_node_id` or a resume point.
#[derive(Clone)]
pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) first_node_id: String,
    /// Linear order of nodes, used for `Next::Continue` when the graph has no conditional edges.
    pub(super) edge_order: Vec<String>,
    pub(super) next_map: HashMap<String, NextEntry<S>>,
    pub(super) checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    pub(super) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    pub(super) state_updater: BoxedStateUpdater<S>,
    pub(super) retry_policy: RetryPolicy,
    pub(super) interrupt_handler: Option<Arc<dyn InterruptHandler>>,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn execute_node_with_retry(&self, node: Arc<dyn Node<S>>, state: S) -> Result<(S, Next), NodeError> {
        let mut attempt = 0;
        loop {
            let current_state = state.clone();
            let result = if let Some(middleware) = &self.middleware {
                let node_id = node.id().to_string();
                let node_clone = node.clone();
                middleware
                    .around_run(
                        &node_id,
                        current_state,
                        Box::new(move |s| {
                            let node = node_clone.clone();
                            Box::pin(async move { node.run(s).await })
                        }),
                    )
                    .await
            } else {
                node.run(current_state).await
            };

            match result {
                Ok(output) => return Ok(output),
                Err(NodeError::Interrupted(interrupt)) => return Err(NodeError::Interrupted(interrupt)),
                Err(e) => {
                    if self.retry_policy.should_retry(attempt) {
                        let delay = self.retry_policy.delay(attempt);
                        if delay > std::time::Duration::ZERO {
                            tokio::time::sleep(delay).await;
                        }
                        attempt += 1;
                        continue;
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn save_checkpoint(&self, config: &RunnableConfig, state: &S, source: CheckpointSource, next_node_id: Option<String>) {
        if let (Some(cp), Some(_)) = (&self.checkpointer, &config.thread_id) {
            let metadata = CheckpointMetadata {
                source,
                step: 0,
                created_at: None,
                next_node_id,
            };
            let checkpoint = Checkpoint::new(uuid::Uuid::new_v4().to_string(), state.clone(), metadata);
            if let Err(e) = cp.put(config, &checkpoint).await {
                tracing::warn!(error = %e, "failed to save checkpoint");
            }
        }
    }

    fn resolve_next_id(&self, current_id: &str, state: &S, next: Next) -> Option<String> {
        if let Some(NextEntry::Conditional(router)) = self.next_map.get(current_id) {
            Some(router.resolve_next(state))
        } else {
            match next {
                Next::End => None,
                Next::Node(id) => Some(id),
                Next::Continue => self
                    .next_map
                    .get(current_id)
                    .and_then(|e| match e {
                        NextEntry::Unconditional(id) => Some(id.clone()),
                        NextEntry::Conditional(_) => None,
                    })
                    .or_else(|| {
                        let pos = self.edge_order.iter().position(|x| x == current_id)?;
                        self.edge_order.get(pos + 1).cloned()
                    }),
            }
        }
    }

    async fn run_loop(&self, mut state: S, config: &RunnableConfig, mut current_id: String) -> Result<S, NodeError> {
        log_graph_start();

        loop {
            let node = self
                .nodes
                .get(&current_id)
                .expect("compiled graph has all nodes")
                .clone();
            let current_state = state.clone();

            log_node_start(&current_id);

            let (new_state, next) = match self.execute_node_with_retry(node, current_state).await {
                Ok(output) => output,
                Err(NodeError::Interrupted(interrupt)) => {
                    self.save_checkpoint(config, &state, CheckpointSource::Interrupt, Some(current_id.clone())).await;
                    if let Some(handler) = &self.interrupt_handler {
                        let _ = handler.on_interrupt(&interrupt.0);
                    }
                    log_graph_error(&NodeError::Interrupted(interrupt.clone()));
                    return Err(NodeError::Interrupted(interrupt));
                }
                Err(e) => {
                    log_graph_error(&e);
                    return Err(e);
                }
            };

            log_node_complete(&current_id, &next);
            self.state_updater.apply_update(&mut state, &new_state);
            log_state_update(&current_id);

            let next_id = self.resolve_next_id(&current_id, &state, next);
            let should_end = next_id.is_none() || next_id.as_deref() == Some(END);
            if should_end {
                self.save_checkpoint(config, &state, CheckpointSource::Loop, None).await;
                log_graph_complete();
                return Ok(state);
            }
            current_id = next_id.expect("checked above");
        }
    }

    /// Runs the graph from the first node. When `config` carries a checkpointer and
    /// a `thread_id`, a checkpoint is written whenever a node interrupts or the run
    /// reaches END.
    pub async fn invoke(&self, state: S, config: Option<RunnableConfig>) -> Result<S, NodeError> {
        if self.nodes.is_empty() || !self.nodes.contains_key(&self.first_node_id) {
            return Err(NodeError::ExecutionFailed("empty graph".into()));
        }
        let config = config.unwrap_or_default();
        let current_id = config
            .resume_from_node_id
            .as_ref()
            .filter(|id| self.nodes.contains_key(id.as_str()))
            .cloned()
            .unwrap_or_else(|| self.first_node_id.clone());
        self.run_loop(state, &config, current_id).await
    }

    /// Resumes a previously interrupted run: loads the last checkpoint for
    /// `config.thread_id`, applies `apply_response` to its state (e.g. folding in an
    /// operator's approval decision), then continues from `config.resume_from_node_id`
    /// (or the checkpoint's own `next_node_id` if the config doesn't override it).
    ///
    /// Clears the thread's checkpoints once the resumed run reaches END, so a given
    /// interrupt can only be resumed once.
    pub async fn resume<F>(&self, config: RunnableConfig, apply_response: F) -> Result<S, NodeError>
    where
        F: FnOnce(S) -> S,
    {
        let checkpointer = self
            .checkpointer
            .as_ref()
            .ok_or_else(|| NodeError::ExecutionFailed("resume requires a checkpointer".into()))?;

        let checkpoint = checkpointer
            .get(&config)
            .await
            .map_err(|e| NodeError::ExecutionFailed(format!("loading checkpoint: {e}")))?
            .ok_or_else(|| NodeError::ExecutionFailed("no checkpoint to resume from".into()))?;

        let resume_node = config
            .resume_from_node_id
            .clone()
            .or(checkpoint.metadata.next_node_id.clone())
            .filter(|id| self.nodes.contains_key(id.as_str()))
            .ok_or_else(|| NodeError::ExecutionFailed("no resumable node id".into()))?;

        let state = apply_response(checkpoint.channel_values);
        let result = self.run_loop(state, &config, resume_node).await;
        if result.is_ok() {
            if let Err(e) = checkpointer.clear(&config).await {
                tracing::warn!(error = %e, "failed to clear checkpoints after resume");
            }
        }
        result
    }
}
