//! In-memory checkpointer. Not persistent; for dev and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::checkpoint::{Checkpoint, CheckpointListItem};
use super::checkpointer::{CheckpointError, Checkpointer};
use super::config::RunnableConfig;

/// In-memory checkpointer, keyed by `thread_id:checkpoint_ns`.
pub struct MemorySaver<S> {
    inner: Arc<RwLock<HashMap<String, Vec<Checkpoint<S>>>>>,
}

impl<S> MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn thread_key(config: &RunnableConfig) -> Result<String, CheckpointError> {
        let thread_id = config
            .thread_id
            .as_deref()
            .ok_or(CheckpointError::ThreadIdRequired)?;
        Ok(format!("{}:{}", thread_id, config.checkpoint_ns))
    }
}

impl<S> Default for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> Checkpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let key = Self::thread_key(config)?;
        let mut guard = self.inner.write().await;
        guard.entry(key).or_default().push(checkpoint.clone());
        Ok(checkpoint.id.clone())
    }

    async fn get(&self, config: &RunnableConfig) -> Result<Option<Checkpoint<S>>, CheckpointError> {
        let key = Self::thread_key(config)?;
        let guard = self.inner.read().await;
        let list = match guard.get(&key) {
            Some(l) if !l.is_empty() => l,
            _ => return Ok(None),
        };
        if let Some(cid) = &config.checkpoint_id {
            Ok(list.iter().find(|cp| &cp.id == cid).cloned())
        } else {
            Ok(list.last().cloned())
        }
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let key = Self::thread_key(config)?;
        let guard = self.inner.read().await;
        let list = match guard.get(&key) {
            Some(l) => l,
            None => return Ok(Vec::new()),
        };
        let mut items: Vec<CheckpointListItem> = list
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
        let key = Self::thread_key(config)?;
        self.inner.write().await.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::checkpoint::CheckpointMetadata;

    fn cfg(thread_id: &str) -> RunnableConfig {
        RunnableConfig {
            thread_id: Some(thread_id.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn put_then_get_returns_latest() {
        let saver: MemorySaver<i32> = MemorySaver::new();
        let config = cfg("t1");
        saver
            .put(
                &config,
                &Checkpoint::new("a".into(), 1, CheckpointMetadata::default()),
            )
            .await
            .unwrap();
        saver
            .put(
                &config,
                &Checkpoint::new("b".into(), 2, CheckpointMetadata::default()),
            )
            .await
            .unwrap();
        let got = saver.get(&config).await.unwrap().unwrap();
        assert_eq!(got.channel_values, 2);
    }

    #[tokio::test]
    async fn clear_removes_all_checkpoints_for_thread() {
        let saver: MemorySaver<i32> = MemorySaver::new();
        let config = cfg("t1");
        saver
            .put(
                &config,
                &Checkpoint::new("a".into(), 1, CheckpointMetadata::default()),
            )
            .await
            .unwrap();
        saver.clear(&config).await.unwrap();
        assert!(saver.get(&config).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_thread_id_errors() {
        let saver: MemorySaver<i32> = MemorySaver::new();
        let config = RunnableConfig::default();
        let err = saver
            .put(
                &config,
                &Checkpoint::new("a".into(), 1, CheckpointMetadata::default()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::ThreadIdRequired));
    }
}
