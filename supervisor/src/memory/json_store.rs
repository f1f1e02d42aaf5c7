//! `MemoryStore` backed by JSON files under `data/<chat_id>/`, write-temp-then-rename.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::{ActionRecord, GroupMetadata, Message};
use crate::errors::MemoryError;

use super::records::{DecisionLog, GroupSyncState, ParticipantRecord};
use super::MemoryStore;

pub struct JsonMemoryStore {
    data_dir: PathBuf,
    logs_dir: PathBuf,
}

impl JsonMemoryStore {
    pub fn new(data_dir: impl Into<PathBuf>, logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            logs_dir: logs_dir.into(),
        }
    }

    fn chat_dir(&self, chat_id: &str) -> PathBuf {
        self.data_dir.join(chat_id)
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, MemoryError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_json<T: Serialize + Sync>(path: &Path, value: &T) -> Result<(), MemoryError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(value)?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &body).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct GroupMetadataFile {
    #[serde(flatten)]
    metadata: GroupMetadata,
    #[serde(flatten)]
    sync: GroupSyncState,
}

#[async_trait]
impl MemoryStore for JsonMemoryStore {
    async fn load_group_metadata(&self, chat_id: &str) -> Result<Option<(GroupMetadata, GroupSyncState)>, MemoryError> {
        let path = self.chat_dir(chat_id).join("group_metadata.json");
        let file: Option<GroupMetadataFile> = Self::read_json(&path).await?;
        Ok(file.map(|f| (f.metadata, f.sync)))
    }

    async fn save_group_metadata(&self, chat_id: &str, metadata: &GroupMetadata, sync: &GroupSyncState) -> Result<(), MemoryError> {
        let path = self.chat_dir(chat_id).join("group_metadata.json");
        let file = GroupMetadataFile {
            metadata: metadata.clone(),
            sync: sync.clone(),
        };
        Self::write_json(&path, &file).await
    }

    async fn load_group_history(&self, chat_id: &str) -> Result<Vec<Message>, MemoryError> {
        let path = self.chat_dir(chat_id).join("group_history.json");
        Ok(Self::read_json(&path).await?.unwrap_or_default())
    }

    async fn save_group_history(&self, chat_id: &str, messages: &[Message]) -> Result<(), MemoryError> {
        let path = self.chat_dir(chat_id).join("group_history.json");
        let mut deduped: Vec<Message> = Vec::with_capacity(messages.len());
        for message in messages {
            if !deduped.iter().any(|m: &Message| m.message_id == message.message_id) {
                deduped.push(message.clone());
            }
        }
        Self::write_json(&path, &deduped).await
    }

    async fn load_participant(&self, chat_id: &str, user_id: &str) -> Result<Option<ParticipantRecord>, MemoryError> {
        let path = self.chat_dir(chat_id).join("participant").join(format!("{user_id}.json"));
        Self::read_json(&path).await
    }

    async fn save_participant(&self, chat_id: &str, record: &ParticipantRecord) -> Result<(), MemoryError> {
        let path = self.chat_dir(chat_id).join("participant").join(format!("{}.json", record.user_id));
        Self::write_json(&path, record).await
    }

    async fn load_agent_actions(&self, chat_id: &str, agent_name: &str) -> Result<Vec<ActionRecord>, MemoryError> {
        let path = self.chat_dir(chat_id).join("actions").join(format!("{agent_name}.json"));
        Ok(Self::read_json(&path).await?.unwrap_or_default())
    }

    async fn append_agent_action(&self, chat_id: &str, agent_name: &str, record: &ActionRecord) -> Result<(), MemoryError> {
        let path = self.chat_dir(chat_id).join("actions").join(format!("{agent_name}.json"));
        let mut records: Vec<ActionRecord> = Self::read_json(&path).await?.unwrap_or_default();
        records.push(record.clone());
        Self::write_json(&path, &records).await
    }

    async fn load_decision_log(&self, group_id: &str) -> Result<DecisionLog, MemoryError> {
        let path = self.logs_dir.join("operator_decisions").join(group_id).join("decisions.json");
        Ok(Self::read_json(&path).await?.unwrap_or_default())
    }

    async fn save_decision_log(&self, group_id: &str, log: &DecisionLog) -> Result<(), MemoryError> {
        let path = self.logs_dir.join("operator_decisions").join(group_id).join("decisions.json");
        Self::write_json(&path, log).await
    }
}
