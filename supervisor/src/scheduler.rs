//! Scheduler (C6): turns the tick's collected `selected_actions` into a FIFO
//! `execution_queue`, marks every message processed, and clears `selected_actions`.

use async_trait::async_trait;

use flowgraph::error::NodeError;
use flowgraph::graph::{Next, Node};

use crate::domain::{QueueItem, SupervisorState};

pub struct Scheduler;

impl Scheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node<SupervisorState> for Scheduler {
    fn id(&self) -> &str {
        "scheduler"
    }

    async fn run(&self, mut state: SupervisorState) -> Result<(SupervisorState, Next), NodeError> {
        let mut queue = Vec::new();
        for (agent_name, action) in &state.selected_actions {
            if !QueueItem::is_schedulable(action) {
                continue;
            }
            if let Some(item) = QueueItem::from_selected_action(agent_name, action) {
                queue.push(item);
            }
        }

        state.execution_queue.extend(queue);
        for message in state.conversation_history.iter_mut() {
            message.processed = true;
        }
        state.selected_actions.clear();

        Ok((state, Next::Continue))
    }
}
