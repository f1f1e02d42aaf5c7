//! Shapes persisted alongside domain types, per §6's persisted-state layout.

use serde::{Deserialize, Serialize};

use crate::domain::Big5;

/// Sync bookkeeping carried alongside `group_metadata.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupSyncState {
    #[serde(default)]
    pub last_sync: Option<String>,
    #[serde(default)]
    pub last_message_id: Option<String>,
    #[serde(default)]
    pub total_messages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalitySnapshot {
    pub analysis_date: String,
    pub messages_analyzed_count: u32,
    pub big5: Big5,
    pub overall_confidence: f64,
}

/// `data/<chat_id>/participant/<user_id>.json`, newest snapshot first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub personality_snapshots: Vec<PersonalitySnapshot>,
}

impl ParticipantRecord {
    pub fn latest_snapshot(&self) -> Option<&PersonalitySnapshot> {
        self.personality_snapshots.first()
    }

    /// Prepends a new snapshot so the list stays newest-first.
    pub fn push_snapshot(&mut self, snapshot: PersonalitySnapshot) {
        self.personality_snapshots.insert(0, snapshot);
    }
}

/// One entry in `decisions.json`'s `approved`/`rejected` arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEntry {
    pub agent_name: String,
    pub action_id: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub timestamp: String,
}

/// `logs/operator_decisions/<group_id>/decisions.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionLog {
    #[serde(default)]
    pub approved: Vec<DecisionEntry>,
    #[serde(default)]
    pub rejected: Vec<DecisionEntry>,
}
