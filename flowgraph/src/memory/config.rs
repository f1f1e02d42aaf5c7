//! Invoke config: thread_id, checkpoint_id, checkpoint_ns, resume_from_node_id.

/// Config for a single graph invocation. Identifies the thread and, when resuming
/// after an interrupt, which checkpoint and node to continue from.
#[derive(Debug, Clone, Default)]
pub struct RunnableConfig {
    /// Unique id for this run/thread. Required when using a checkpointer.
    pub thread_id: Option<String>,
    /// If set, load state from this checkpoint instead of the latest (time travel).
    pub checkpoint_id: Option<String>,
    /// Optional namespace for checkpoints (e.g. subgraph runs). Default empty.
    pub checkpoint_ns: String,
    /// When set, the graph starts from this node instead of the first. Used when
    /// resuming after a human-approval interrupt: load the checkpoint, apply the
    /// operator's response to state, then continue from the node after the gate.
    pub resume_from_node_id: Option<String>,
}
