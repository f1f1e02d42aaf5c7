//! Checkpoint and metadata types.

use serde::{Deserialize, Serialize};

/// Current checkpoint format version.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Source of a checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckpointSource {
    /// Created from the initial input to invoke.
    #[default]
    Input,
    /// Created from inside the run loop, at a step boundary.
    Loop,
    /// Created at an interrupt, so the run can resume from exactly this point.
    Interrupt,
}

/// Metadata for a single checkpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    /// Step number at which this checkpoint was taken (-1 = input, 0+ = loop steps).
    pub step: i64,
    /// ISO-8601 timestamp, set by the caller (the engine does not read the clock).
    pub created_at: Option<String>,
    /// The node the run was about to execute when this checkpoint was taken; used
    /// to resume from the right place.
    pub next_node_id: Option<String>,
}

/// One checkpoint: state snapshot plus metadata, keyed by `(thread_id, checkpoint_ns, id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint<S> {
    pub v: u32,
    pub id: String,
    pub channel_values: S,
    pub metadata: CheckpointMetadata,
}

impl<S> Checkpoint<S> {
    pub fn new(id: String, state: S, metadata: CheckpointMetadata) -> Self {
        Self {
            v: CHECKPOINT_VERSION,
            id,
            channel_values: state,
            metadata,
        }
    }
}

/// Lightweight listing entry (no state payload), for `Checkpointer::list`.
#[derive(Debug, Clone)]
pub struct CheckpointListItem {
    pub checkpoint_id: String,
    pub metadata: CheckpointMetadata,
}
