//! Node middleware: wraps node execution with custom async logic (logging, tracing spans, timing).

use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use crate::error::NodeError;

use super::Next;

/// A boxed async node execution function, passed to middleware as the "inner" call.
pub type NodeRunFn<S> =
    Box<dyn FnOnce(S) -> Pin<Box<dyn Future<Output = Result<(S, Next), NodeError>> + Send>> + Send>;

/// Wraps node execution with custom async logic.
///
/// `around_run` receives the node id, the input state, and a boxed closure that
/// invokes the node itself; middleware decides whether/when to call it.
#[async_trait]
pub trait NodeMiddleware<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        next: NodeRunFn<S>,
    ) -> Result<(S, Next), NodeError>;
}
