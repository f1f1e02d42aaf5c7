//! Default node middleware: structured tracing spans around each node run.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::NodeError;

use super::node_middleware::{NodeMiddleware, NodeRunFn};
use super::Next;

/// Logs node start/complete/error via `tracing`. The default middleware used unless
/// a graph overrides it with `with_middleware`.
#[derive(Debug, Clone, Default)]
pub struct LoggingNodeMiddleware;

#[async_trait]
impl<S> NodeMiddleware<S> for LoggingNodeMiddleware
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        next: NodeRunFn<S>,
    ) -> Result<(S, Next), NodeError> {
        tracing::debug!(node_id, "node start");
        let result = next(state).await;
        match &result {
            Ok((_, next)) => tracing::debug!(node_id, ?next, "node complete"),
            Err(e) => tracing::warn!(node_id, error = %e, "node error"),
        }
        result
    }
}
