//! Persisted supervisor state: group/participant/action records as JSON files under
//! `data/<chat_id>/`, plus the two-file approval IPC protocol.
//!
//! Every write goes to a temp file in the same directory, then an atomic rename,
//! matching `flowgraph::memory::JsonFileSaver`'s approach for the graph's own
//! checkpoints.

mod approval_ipc;
mod json_store;
mod records;

pub use approval_ipc::{
    ApprovalConfig, ApprovalIpc, ApprovalRequestData, ApprovalRequestPayload, ApprovalResponsePayload, Decision, GroupInfo, OperatorDecision,
    ResponseBody,
};
pub use json_store::JsonMemoryStore;
pub use records::{DecisionEntry, DecisionLog, GroupSyncState, ParticipantRecord, PersonalitySnapshot};

use async_trait::async_trait;

use crate::domain::{ActionRecord, GroupMetadata, Message};
use crate::errors::MemoryError;

#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn load_group_metadata(&self, chat_id: &str) -> Result<Option<(GroupMetadata, GroupSyncState)>, MemoryError>;
    async fn save_group_metadata(&self, chat_id: &str, metadata: &GroupMetadata, sync: &GroupSyncState) -> Result<(), MemoryError>;

    async fn load_group_history(&self, chat_id: &str) -> Result<Vec<Message>, MemoryError>;
    async fn save_group_history(&self, chat_id: &str, messages: &[Message]) -> Result<(), MemoryError>;

    async fn load_participant(&self, chat_id: &str, user_id: &str) -> Result<Option<ParticipantRecord>, MemoryError>;
    async fn save_participant(&self, chat_id: &str, record: &ParticipantRecord) -> Result<(), MemoryError>;

    async fn load_agent_actions(&self, chat_id: &str, agent_name: &str) -> Result<Vec<ActionRecord>, MemoryError>;
    async fn append_agent_action(&self, chat_id: &str, agent_name: &str, record: &ActionRecord) -> Result<(), MemoryError>;

    async fn load_decision_log(&self, group_id: &str) -> Result<DecisionLog, MemoryError>;
    async fn save_decision_log(&self, group_id: &str, log: &DecisionLog) -> Result<(), MemoryError>;
}
