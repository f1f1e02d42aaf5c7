//! Checkpointing: state persistence for suspend/resume across interrupts and
//! process restarts.

pub mod checkpoint;
pub mod checkpointer;
pub mod config;
pub mod json_file_saver;
pub mod memory_saver;

pub use checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource, CHECKPOINT_VERSION};
pub use checkpointer::{CheckpointError, Checkpointer};
pub use config::RunnableConfig;
pub use json_file_saver::JsonFileSaver;
pub use memory_saver::MemorySaver;
