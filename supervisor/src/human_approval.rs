//! Human-Approval Gate (C7): suspends the graph for operator review of the pending
//! execution queue, via `flowgraph`'s interrupt/resume primitives.
//!
//! The gate node's job ends at raising the interrupt — the run loop (C9) owns the
//! polling wait and the later `resume` call. `apply_operator_response` is the
//! closure the run loop folds into state on resume.

use async_trait::async_trait;
use uuid::Uuid;

use flowgraph::error::NodeError;
use flowgraph::graph::interrupt::Interrupt;
use flowgraph::graph::{Next, Node};

use crate::domain::{QueueItem, QueueStatus, SupervisorState, TargetMessage};
use crate::format::{format_message_for_prompt, FormatOptions};
use crate::memory::{
    ApprovalConfig, ApprovalIpc, ApprovalRequestData, ApprovalRequestPayload, ApprovalResponsePayload, Decision, DecisionEntry, GroupInfo,
};

const CONTEXT_WINDOW: usize = 10;

/// Gate node. Forwards unchanged when `hitl_enabled` is false; otherwise publishes
/// the pending queue to the approval IPC channel and raises an interrupt.
pub struct HumanApprovalGate {
    ipc: ApprovalIpc,
    hitl_enabled: bool,
}

impl HumanApprovalGate {
    pub fn new(ipc: ApprovalIpc, hitl_enabled: bool) -> Self {
        Self { ipc, hitl_enabled }
    }
}

#[async_trait]
impl Node<SupervisorState> for HumanApprovalGate {
    fn id(&self) -> &str {
        "human_approval"
    }

    async fn run(&self, mut state: SupervisorState) -> Result<(SupervisorState, Next), NodeError> {
        if !self.hitl_enabled || state.execution_queue.is_empty() {
            return Ok((state, Next::Continue));
        }

        let request_id = Uuid::new_v4().to_string();
        let payload = build_approval_request(&state, &request_id);

        self.ipc
            .publish_request(&payload)
            .await
            .map_err(|e| NodeError::ExecutionFailed(format!("publishing approval request: {e}")))?;

        state.approval_request_id = Some(request_id.clone());

        Err(Interrupt::with_id(serde_json::to_value(&payload).unwrap_or(serde_json::Value::Null), request_id).into())
    }
}

fn build_approval_request(state: &SupervisorState, request_id: &str) -> ApprovalRequestPayload {
    let context_messages = state
        .conversation_history
        .iter()
        .rev()
        .take(CONTEXT_WINDOW)
        .rev()
        .map(|m| format_message_for_prompt(m, FormatOptions::default(), &[], None, None))
        .collect();

    ApprovalRequestPayload {
        config: ApprovalConfig {
            thread_id: request_id.to_string(),
        },
        data: ApprovalRequestData {
            pending_messages: state.execution_queue.clone(),
            group_info: GroupInfo {
                group_name: state.group.group_name.clone(),
                topic: state.group.topic.clone(),
            },
            context_messages,
            total_pending: state.execution_queue.len(),
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// Folds the operator's response into `state.execution_queue`: approved items (with
/// any edit applied) pass through, rejected items are dropped, and a
/// `replacement_message` becomes a new `operator_replacement` queue item. An item
/// with no matching decision defaults to rejected — the operator never got to it,
/// so it must not reach the executor unapproved. Always clears `approval_request_id`;
/// the caller is responsible for clearing IPC state.
pub fn apply_operator_response(mut state: SupervisorState, response: &ApprovalResponsePayload) -> SupervisorState {
    let mut kept = Vec::new();
    let mut replacements = Vec::new();

    for item in state.execution_queue.into_iter() {
        let decision = response.response.decisions.iter().find(|d| d.agent_name == item.agent_name);
        match decision {
            None => {
                tracing::info!(agent = %item.agent_name, "no operator decision for queued action, defaulting to rejected");
            }
            Some(d) => match d.decision {
                Decision::Approved => {
                    let mut approved = item;
                    if let Some(edited) = &d.edited_content {
                        approved.edited_content = Some(edited.clone());
                    }
                    kept.push(approved);
                }
                Decision::Rejected => {
                    tracing::info!(agent = %item.agent_name, reason = ?d.rejection_reason, "operator rejected queued action");
                    if let Some(replacement_text) = &d.replacement_message {
                        replacements.push(QueueItem {
                            agent_name: item.agent_name.clone(),
                            agent_type: item.agent_type.clone(),
                            action_id: "operator_replacement".to_string(),
                            purpose: "operator replacement".to_string(),
                            styled_response: replacement_text.clone(),
                            phone_number: item.phone_number.clone(),
                            trigger_id: item.trigger_id.clone(),
                            trigger_justification: item.trigger_justification.clone(),
                            target_message: item.target_message.clone(),
                            timestamp: item.timestamp.clone(),
                            status: QueueStatus::Pending,
                            edited_content: None,
                        });
                    }
                }
            },
        }
    }

    kept.extend(replacements);
    state.execution_queue = kept;
    state.approval_request_id = None;
    state
}

/// Splits the operator's decisions into approved/rejected `DecisionEntry` rows
/// against the queue as it stood when the interrupt was raised, for the run loop
/// to persist via `MemoryStore::save_decision_log`. Items with no matching decision
/// produce no entry.
pub fn decision_log_entries(queue: &[QueueItem], response: &ApprovalResponsePayload) -> (Vec<DecisionEntry>, Vec<DecisionEntry>) {
    let mut approved = Vec::new();
    let mut rejected = Vec::new();

    for item in queue {
        let Some(d) = response.response.decisions.iter().find(|d| d.agent_name == item.agent_name) else {
            continue;
        };
        let entry = DecisionEntry {
            agent_name: item.agent_name.clone(),
            action_id: item.action_id.clone(),
            reason: d.rejection_reason.clone(),
            timestamp: response.timestamp.clone(),
        };
        match d.decision {
            Decision::Approved => approved.push(entry),
            Decision::Rejected => rejected.push(entry),
        }
    }

    (approved, rejected)
}
