//! Two-file IPC protocol (`pending.json`/`response.json`) an external approval UI
//! reads and writes. The supervisor and the UI are the only two participants.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::QueueItem;
use crate::errors::MemoryError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfo {
    pub group_name: String,
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequestData {
    pub pending_messages: Vec<QueueItem>,
    pub group_info: GroupInfo,
    #[serde(default)]
    pub context_messages: Vec<String>,
    pub total_pending: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalConfig {
    pub thread_id: String,
}

/// `pending.json`. Presence means the supervisor is waiting for a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequestPayload {
    pub config: ApprovalConfig,
    pub data: ApprovalRequestData,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorDecision {
    pub agent_name: String,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_message: Option<String>,
}

/// `response.json`. Appearance unblocks the supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalResponsePayload {
    pub response: ResponseBody,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseBody {
    pub decisions: Vec<OperatorDecision>,
}

pub struct ApprovalIpc {
    state_dir: PathBuf,
}

impl ApprovalIpc {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self { state_dir: state_dir.into() }
    }

    fn pending_path(&self) -> PathBuf {
        self.state_dir.join("pending.json")
    }

    fn response_path(&self) -> PathBuf {
        self.state_dir.join("response.json")
    }

    async fn write_json(path: &Path, value: &impl Serialize) -> Result<(), MemoryError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(value)?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &body).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }

    async fn remove_if_exists(path: &Path) -> Result<(), MemoryError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Publishes the approval request, clearing any stale response file first so a
    /// leftover response from a previous request can't be mistaken for this one's.
    pub async fn publish_request(&self, request: &ApprovalRequestPayload) -> Result<(), MemoryError> {
        Self::remove_if_exists(&self.response_path()).await?;
        Self::write_json(&self.pending_path(), request).await
    }

    /// Polls for a response file. Returns `None` if the operator hasn't responded yet.
    pub async fn poll_response(&self) -> Result<Option<ApprovalResponsePayload>, MemoryError> {
        match tokio::fs::read(self.response_path()).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes both files after the response has been consumed.
    pub async fn clear(&self) -> Result<(), MemoryError> {
        Self::remove_if_exists(&self.pending_path()).await?;
        Self::remove_if_exists(&self.response_path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ApprovalRequestPayload {
        ApprovalRequestPayload {
            config: ApprovalConfig { thread_id: "t1".into() },
            data: ApprovalRequestData {
                pending_messages: vec![],
                group_info: GroupInfo {
                    group_name: "Cohort A".into(),
                    topic: "fitness".into(),
                },
                context_messages: vec![],
                total_pending: 0,
            },
            timestamp: "2025-01-01T00:00:00.000Z".into(),
        }
    }

    #[tokio::test]
    async fn poll_response_returns_none_when_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let ipc = ApprovalIpc::new(tmp.path());
        assert!(ipc.poll_response().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn publish_then_poll_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let ipc = ApprovalIpc::new(tmp.path());
        ipc.publish_request(&request()).await.unwrap();
        assert!(tmp.path().join("pending.json").exists());

        let response = ApprovalResponsePayload {
            response: ResponseBody {
                decisions: vec![OperatorDecision {
                    agent_name: "Alex".into(),
                    decision: Decision::Approved,
                    edited_content: None,
                    rejection_reason: None,
                    replacement_message: None,
                }],
            },
            timestamp: "2025-01-01T00:00:01.000Z".into(),
        };
        ApprovalIpc::write_json(&ipc.response_path(), &response).await.unwrap();

        let polled = ipc.poll_response().await.unwrap().unwrap();
        assert_eq!(polled.response.decisions[0].agent_name, "Alex");
    }

    #[tokio::test]
    async fn clear_removes_both_files() {
        let tmp = tempfile::tempdir().unwrap();
        let ipc = ApprovalIpc::new(tmp.path());
        ipc.publish_request(&request()).await.unwrap();
        ipc.clear().await.unwrap();
        assert!(!tmp.path().join("pending.json").exists());
        assert!(!tmp.path().join("response.json").exists());
    }

    #[tokio::test]
    async fn publish_clears_stale_response_file() {
        let tmp = tempfile::tempdir().unwrap();
        let ipc = ApprovalIpc::new(tmp.path());
        std::fs::write(tmp.path().join("response.json"), "stale").unwrap();
        ipc.publish_request(&request()).await.unwrap();
        assert!(!tmp.path().join("response.json").exists());
    }
}
