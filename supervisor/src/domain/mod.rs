//! Typed state shapes for every bag of data threaded through the pipeline, plus the
//! two reducers the distilled spec's `Annotated[...]` fields call for.

mod action;
mod agent_state;
mod message;
mod persona;
mod supervisor_state;
mod trim;

pub use action::{
    ActionCatalog, ActionDefinition, ActionRecord, DetectedTrigger, QueueItem, QueueStatus,
    SelectedAction, TargetMessage, TriggerCatalog, TriggerDefinition,
};
pub use agent_state::AgentState;
pub use message::{Big5, Message, MessageEmotion, Reaction, TraitScore, BIG_FIVE_TRAITS};
pub use persona::Persona;
pub use supervisor_state::{apply_selected_actions, merge_agent_actions, GroupMetadata, SupervisorState};
pub use trim::trim_recent_messages;
