//! File-backed checkpointer (`JsonFileSaver`). Persistent across process restarts.
//!
//! One JSON file per thread, holding the full checkpoint history for that thread.
//! Writes go to a temp file in the same directory, then an atomic rename, so a
//! crash mid-write never leaves a truncated or partially-written checkpoint file
//! behind (the rename either lands or it doesn't).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use super::checkpoint::{Checkpoint, CheckpointListItem};
use super::checkpointer::{CheckpointError, Checkpointer};
use super::config::RunnableConfig;

/// File-backed checkpointer. Key: `(thread_id, checkpoint_ns)` maps to one file
/// `<dir>/<thread_id>__<checkpoint_ns>.json` holding a JSON array of checkpoints.
pub struct JsonFileSaver<S> {
    dir: PathBuf,
    _marker: std::marker::PhantomData<S>,
}

impl<S> JsonFileSaver<S>
where
    S: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _marker: std::marker::PhantomData,
        }
    }

    fn file_path(&self, config: &RunnableConfig) -> Result<PathBuf, CheckpointError> {
        let thread_id = config
            .thread_id
            .as_deref()
            .ok_or(CheckpointError::ThreadIdRequired)?;
        let ns = if config.checkpoint_ns.is_empty() {
            "_"
        } else {
            config.checkpoint_ns.as_str()
        };
        let safe_thread = sanitize(thread_id);
        let safe_ns = sanitize(ns);
        Ok(self.dir.join(format!("{safe_thread}__{safe_ns}.json")))
    }

    async fn read_all(path: &Path) -> Result<Vec<Checkpoint<S>>, CheckpointError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| CheckpointError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(CheckpointError::Storage(e.to_string())),
        }
    }

    async fn write_all(path: &Path, checkpoints: &[Checkpoint<S>]) -> Result<(), CheckpointError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        }
        let body = serde_json::to_vec_pretty(checkpoints)
            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &body)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        Ok(())
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[async_trait]
impl<S> Checkpointer<S> for JsonFileSaver<S>
where
    S: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let path = self.file_path(config)?;
        let mut checkpoints = Self::read_all(&path).await?;
        checkpoints.push(checkpoint.clone());
        Self::write_all(&path, &checkpoints).await?;
        Ok(checkpoint.id.clone())
    }

    async fn get(&self, config: &RunnableConfig) -> Result<Option<Checkpoint<S>>, CheckpointError> {
        let path = self.file_path(config)?;
        let checkpoints = Self::read_all(&path).await?;
        if let Some(cid) = &config.checkpoint_id {
            Ok(checkpoints.into_iter().find(|cp| &cp.id == cid))
        } else {
            Ok(checkpoints.into_iter().last())
        }
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let path = self.file_path(config)?;
        let checkpoints = Self::read_all(&path).await?;
        let mut items: Vec<CheckpointListItem> = checkpoints
            .iter()
            .map(|cp| CheckpointListItem {
                checkpoint_id: cp.id.clone(),
                metadata: cp.metadata.clone(),
            })
            .collect();
        if let Some(n) = limit {
            if items.len() > n {
                items = items.split_off(items.len() - n);
            }
        }
        Ok(items)
    }

    async fn clear(&self, config: &RunnableConfig) -> Result<(), CheckpointError> {
        let path = self.file_path(config)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CheckpointError::Storage(e.to_string())),
        }
    }
}
