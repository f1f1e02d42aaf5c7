//! Executor (C8): dispatches the approved `execution_queue` to the chat transport,
//! pacing sends with a typing indicator and an inter-send cooldown.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use flowgraph::error::NodeError;
use flowgraph::graph::{Next, Node};

use crate::domain::{QueueStatus, SupervisorState};
use crate::time::{format_timestamp_millis, parse_timestamp, typing_duration};
use crate::transport::ChatTransport;

/// Pace between consecutive sends within one tick, when more than one action fires.
const EXECUTOR_COOLDOWN: Duration = Duration::from_secs(160);
/// The typing indicator is shown for the full estimated duration, but the executor
/// only sleeps a fraction of it before sending — an intentional undershoot.
const TYPING_SLEEP_DIVISOR: u32 = 750;

pub struct Executor {
    transport: Arc<dyn ChatTransport>,
}

impl Executor {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Node<SupervisorState> for Executor {
    fn id(&self) -> &str {
        "executor"
    }

    async fn run(&self, mut state: SupervisorState) -> Result<(SupervisorState, Next), NodeError> {
        let chat_id = state.group.group_id.clone();
        let most_recent_timestamp = state.conversation_history.last().map(|m| m.timestamp.clone());

        let mut executed = 0usize;
        for item in state.execution_queue.iter_mut() {
            if item.status != QueueStatus::Pending {
                continue;
            }

            if executed > 0 {
                tokio::time::sleep(EXECUTOR_COOLDOWN).await;
            }

            let content = item.edited_content.clone().unwrap_or_else(|| item.styled_response.clone());

            let result = if item.action_id == "add_reaction" {
                match parse_timestamp(&item.target_message.timestamp) {
                    Ok(dt) => self.transport.add_reaction(&item.phone_number, &chat_id, &format_timestamp_millis(dt), &content).await,
                    Err(e) => Err(crate::errors::TransportError::UnexpectedResponse(format!("invalid target_message timestamp: {e}"))),
                }
            } else {
                let reply_to = if most_recent_timestamp.as_deref() == Some(item.target_message.timestamp.as_str()) {
                    None
                } else if item.target_message.timestamp.is_empty() {
                    None
                } else {
                    Some(item.target_message.timestamp.clone())
                };

                let duration = typing_duration(&content);
                let _ = self.transport.send_typing(&item.phone_number, &chat_id, duration.as_millis() as u64).await;
                tokio::time::sleep(duration / TYPING_SLEEP_DIVISOR).await;
                self.transport.send_message(&item.phone_number, &chat_id, &content, reply_to.as_deref()).await
            };

            match result {
                Ok(()) => {
                    item.status = QueueStatus::Sent;
                    executed += 1;
                }
                Err(e) => {
                    tracing::warn!(agent = %item.agent_name, error = %e, "executor dispatch failed");
                    item.status = QueueStatus::Failed;
                }
            }
        }

        state.execution_queue.clear();
        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GroupMetadata, Message, QueueItem, TargetMessage};
    use crate::transport::{MockChatTransport, ParticipantsInfo};

    fn message(id: &str, ts: &str) -> Message {
        Message {
            message_id: id.into(),
            sender_id: "u1".into(),
            sender_username: "bob".into(),
            sender_first_name: "".into(),
            sender_last_name: "".into(),
            text: "hi".into(),
            date: chrono::Utc::now(),
            timestamp: ts.into(),
            reactions: vec![],
            reply_to_message_id: None,
            message_emotion: None,
            sender_personality: None,
            processed: false,
        }
    }

    fn item(agent: &str, action_id: &str, content: &str, target_ts: &str) -> QueueItem {
        QueueItem {
            agent_name: agent.into(),
            agent_type: "coach".into(),
            action_id: action_id.into(),
            purpose: "encourage".into(),
            styled_response: content.into(),
            phone_number: "+1555".into(),
            trigger_id: "struggling".into(),
            trigger_justification: "said hard".into(),
            target_message: TargetMessage {
                timestamp: target_ts.into(),
                text: "hard".into(),
            },
            timestamp: target_ts.into(),
            status: QueueStatus::Pending,
            edited_content: None,
        }
    }

    fn transport() -> Arc<MockChatTransport> {
        Arc::new(MockChatTransport::new(
            vec![],
            ParticipantsInfo {
                chat_title: "g".into(),
                chat_description: "".into(),
                participants_count: 1,
            },
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn sends_message_as_reply_when_not_most_recent() {
        let history = vec![message("1", "2025-01-01T00:00:00.000Z"), message("2", "2025-01-01T00:01:00.000Z")];
        let mut state = SupervisorState::new(GroupMetadata { group_id: "g1".into(), ..Default::default() }, history);
        state.execution_queue.push(item("Alex", "nudge", "keep going!", "2025-01-01T00:00:00.000Z"));

        let transport = transport();
        let executor = Executor::new(transport.clone());
        let (out, next) = executor.run(state).await.unwrap();

        assert_eq!(next, Next::Continue);
        assert!(out.execution_queue.is_empty());
        let calls = transport.calls();
        assert!(calls.iter().any(|c| matches!(c, crate::transport::RecordedCall::Send { reply_to_timestamp: Some(ts), .. } if ts == "2025-01-01T00:00:00.000Z")));
    }

    #[tokio::test(start_paused = true)]
    async fn elides_reply_when_target_is_most_recent_message() {
        let history = vec![message("1", "2025-01-01T00:01:00.000Z")];
        let mut state = SupervisorState::new(GroupMetadata { group_id: "g1".into(), ..Default::default() }, history);
        state.execution_queue.push(item("Alex", "nudge", "keep going!", "2025-01-01T00:01:00.000Z"));

        let transport = transport();
        let executor = Executor::new(transport.clone());
        executor.run(state).await.unwrap();

        let calls = transport.calls();
        assert!(calls.iter().any(|c| matches!(c, crate::transport::RecordedCall::Send { reply_to_timestamp: None, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn add_reaction_action_calls_add_reaction_not_send() {
        let mut state = SupervisorState::new(GroupMetadata { group_id: "g1".into(), ..Default::default() }, vec![]);
        state.execution_queue.push(item("Alex", "add_reaction", "👍", "2025-01-01T00:00:00.000Z"));

        let transport = transport();
        let executor = Executor::new(transport.clone());
        executor.run(state).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], crate::transport::RecordedCall::Reaction { emoji, .. } if emoji == "👍"));
    }

    #[tokio::test(start_paused = true)]
    async fn edited_content_overrides_styled_response() {
        let mut state = SupervisorState::new(GroupMetadata { group_id: "g1".into(), ..Default::default() }, vec![]);
        let mut queued = item("Alex", "nudge", "original", "2025-01-01T00:00:00.000Z");
        queued.edited_content = Some("operator edit".into());
        state.execution_queue.push(queued);

        let transport = transport();
        let executor = Executor::new(transport.clone());
        executor.run(state).await.unwrap();

        let calls = transport.calls();
        assert!(calls.iter().any(|c| matches!(c, crate::transport::RecordedCall::Send { content, .. } if content == "operator edit")));
    }

    #[tokio::test(start_paused = true)]
    async fn add_reaction_without_target_timestamp_is_dropped_without_dispatch() {
        let mut state = SupervisorState::new(GroupMetadata { group_id: "g1".into(), ..Default::default() }, vec![]);
        state.execution_queue.push(item("Alex", "add_reaction", "👍", ""));

        let transport = transport();
        let executor = Executor::new(transport.clone());
        let (out, _) = executor.run(state).await.unwrap();

        assert!(out.execution_queue.is_empty());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_send_marks_item_status_but_does_not_abort_loop() {
        let participants = ParticipantsInfo {
            chat_title: "g".into(),
            chat_description: "".into(),
            participants_count: 1,
        };
        let transport = Arc::new(MockChatTransport::new(vec![], participants).failing_sends());
        let mut state = SupervisorState::new(GroupMetadata { group_id: "g1".into(), ..Default::default() }, vec![]);
        state.execution_queue.push(item("Alex", "nudge", "hi", "2025-01-01T00:00:00.000Z"));

        let executor = Executor::new(transport.clone());
        let (out, _) = executor.run(state).await.unwrap();
        assert!(out.execution_queue.is_empty());
    }
}
