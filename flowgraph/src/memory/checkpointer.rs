//! Checkpointer trait: saves and loads checkpoints by `(thread_id, checkpoint_ns, checkpoint_id)`.

use async_trait::async_trait;
use thiserror::Error;

use super::checkpoint::{Checkpoint, CheckpointListItem};
use super::config::RunnableConfig;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("thread_id required")]
    ThreadIdRequired,
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Saves and loads checkpoints so a suspended graph run can resume later, possibly
/// in a different process.
///
/// **Interaction**: injected via `StateGraph::compile_with_checkpointer`;
/// `CompiledStateGraph::invoke` saves a checkpoint whenever a node interrupts, and
/// `CompiledStateGraph::resume` loads it back.
#[async_trait]
pub trait Checkpointer<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    /// Persists a checkpoint for the thread. Returns the checkpoint id used.
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError>;

    /// Loads the latest checkpoint for the thread (or the one given by
    /// `config.checkpoint_id`).
    async fn get(&self, config: &RunnableConfig) -> Result<Option<Checkpoint<S>>, CheckpointError>;

    /// Lists checkpoint ids for the thread, newest last.
    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError>;

    /// Deletes all checkpoints for the thread. Called once a suspended run has been
    /// resumed and completed, so stale checkpoints don't accumulate.
    async fn clear(&self, config: &RunnableConfig) -> Result<(), CheckpointError>;
}
