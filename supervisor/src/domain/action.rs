//! Action-pipeline types: what an agent decided to do, what's queued for dispatch,
//! and what actually got sent.

use serde::{Deserialize, Serialize};

/// A catalog-defined trigger condition that an agent subgraph can detect in a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub suggested_action_ids: Vec<String>,
}

/// A catalog-defined action an agent can take once a trigger fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub id: String,
    pub purpose: String,
    #[serde(default)]
    pub description: String,
}

/// All triggers/actions available to one persona, loaded from its catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerCatalog {
    pub triggers: Vec<TriggerDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionCatalog {
    pub actions: Vec<ActionDefinition>,
}

impl TriggerCatalog {
    pub fn find(&self, id: &str) -> Option<&TriggerDefinition> {
        self.triggers.iter().find(|t| t.id == id)
    }
}

impl ActionCatalog {
    pub fn find(&self, id: &str) -> Option<&ActionDefinition> {
        self.actions.iter().find(|a| a.id == id)
    }
}

/// Output of trigger_analysis: the trigger the agent believes applies to the target
/// message, or `None` for the reserved `"neutral"`/`"ERROR"` trigger ids. The model
/// may additionally point at a specific earlier message instead of the most recent
/// one; when absent, callers fall back to the default target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedTrigger {
    pub trigger_id: String,
    pub justification: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_message: Option<TargetMessage>,
}

impl DetectedTrigger {
    pub fn is_neutral(&self) -> bool {
        self.trigger_id == "neutral" || self.trigger_id == "ERROR"
    }
}

/// The message the agent subgraph is reacting to, carried alongside the trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetMessage {
    pub timestamp: String,
    pub text: String,
}

/// Outcome of one persona's agent subgraph run for the current tick. `status`
/// mirrors the four terminal states of the orchestrator's routing table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SelectedAction {
    NoActionNeeded {
        reason: String,
    },
    Error {
        reason: String,
        error: String,
    },
    Success {
        action_id: String,
        purpose: String,
        styled_response: String,
        agent_type: String,
        agent_name: String,
        phone_number: String,
        trigger_id: String,
        trigger_justification: String,
        target_message: TargetMessage,
        retry_count: u32,
    },
    MaxRetriesReached {
        action_id: String,
        purpose: String,
        styled_response: String,
        agent_type: String,
        agent_name: String,
        phone_number: String,
        trigger_id: String,
        trigger_justification: String,
        target_message: TargetMessage,
        validation_note: String,
        retry_count: u32,
    },
}

impl SelectedAction {
    pub fn is_actionable(&self) -> bool {
        matches!(self, SelectedAction::Success { .. })
    }
}

/// One entry in the supervisor's persisted per-agent action history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub agent_name: String,
    pub agent_type: String,
    pub action_id: String,
    pub purpose: String,
    pub styled_response: String,
    pub trigger_id: String,
    pub trigger_justification: String,
    pub target_message: TargetMessage,
    pub timestamp: String,
}

/// Dispatch status of a queued action as it moves through scheduling and execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Sent,
    Failed,
}

/// One item built by the scheduler (C6) from a `Success` `SelectedAction`, carried
/// through human approval (C7) and execution (C8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub agent_name: String,
    pub agent_type: String,
    pub action_id: String,
    pub purpose: String,
    pub styled_response: String,
    pub phone_number: String,
    pub trigger_id: String,
    pub trigger_justification: String,
    pub target_message: TargetMessage,
    pub timestamp: String,
    pub status: QueueStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_content: Option<String>,
}

impl QueueItem {
    pub fn from_selected_action(agent_name: &str, action: &SelectedAction) -> Option<Self> {
        match action {
            SelectedAction::Success {
                action_id,
                purpose,
                styled_response,
                agent_type,
                phone_number,
                trigger_id,
                trigger_justification,
                target_message,
                ..
            } => Some(QueueItem {
                agent_name: agent_name.to_string(),
                agent_type: agent_type.clone(),
                action_id: action_id.clone(),
                purpose: purpose.clone(),
                styled_response: styled_response.clone(),
                phone_number: phone_number.clone(),
                trigger_id: trigger_id.clone(),
                trigger_justification: trigger_justification.clone(),
                target_message: target_message.clone(),
                timestamp: target_message.timestamp.clone(),
                status: QueueStatus::Pending,
                edited_content: None,
            }),
            SelectedAction::MaxRetriesReached {
                action_id,
                purpose,
                styled_response,
                agent_type,
                phone_number,
                trigger_id,
                trigger_justification,
                target_message,
                ..
            } => Some(QueueItem {
                agent_name: agent_name.to_string(),
                agent_type: agent_type.clone(),
                action_id: action_id.clone(),
                purpose: purpose.clone(),
                styled_response: styled_response.clone(),
                phone_number: phone_number.clone(),
                trigger_id: trigger_id.clone(),
                trigger_justification: trigger_justification.clone(),
                target_message: target_message.clone(),
                timestamp: target_message.timestamp.clone(),
                status: QueueStatus::Pending,
                edited_content: None,
            }),
            _ => None,
        }
    }

    /// Filters for scheduling: both `no_action_needed` and `error` statuses are excluded.
    pub fn is_schedulable(action: &SelectedAction) -> bool {
        matches!(action, SelectedAction::Success { .. } | SelectedAction::MaxRetriesReached { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success() -> SelectedAction {
        SelectedAction::Success {
            action_id: "nudge".into(),
            purpose: "encourage".into(),
            styled_response: "keep going!".into(),
            agent_type: "coach".into(),
            agent_name: "Alex".into(),
            phone_number: "+1555".into(),
            trigger_id: "struggling".into(),
            trigger_justification: "user said it's hard".into(),
            target_message: TargetMessage {
                timestamp: "2025-01-01T00:00:00.000Z".into(),
                text: "this is hard".into(),
            },
            retry_count: 0,
        }
    }

    fn max_retries() -> SelectedAction {
        SelectedAction::MaxRetriesReached {
            action_id: "nudge".into(),
            purpose: "encourage".into(),
            styled_response: "keep going!".into(),
            agent_type: "coach".into(),
            agent_name: "Alex".into(),
            phone_number: "+1555".into(),
            trigger_id: "struggling".into(),
            trigger_justification: "user said it's hard".into(),
            target_message: TargetMessage {
                timestamp: "2025-01-01T00:00:00.000Z".into(),
                text: "this is hard".into(),
            },
            validation_note: "still rejected".into(),
            retry_count: 3,
        }
    }

    #[test]
    fn queue_item_built_from_success_or_max_retries() {
        let item = QueueItem::from_selected_action("Alex", &success()).unwrap();
        assert_eq!(item.status, QueueStatus::Pending);
        assert_eq!(item.agent_name, "Alex");

        let retried = QueueItem::from_selected_action("Alex", &max_retries()).unwrap();
        assert_eq!(retried.status, QueueStatus::Pending);
        assert_eq!(retried.styled_response, "keep going!");

        let noop = SelectedAction::NoActionNeeded {
            reason: "no_trigger_detected".into(),
        };
        assert!(QueueItem::from_selected_action("Alex", &noop).is_none());
    }

    #[test]
    fn schedulable_excludes_no_action_and_error() {
        assert!(QueueItem::is_schedulable(&success()));
        assert!(!QueueItem::is_schedulable(&SelectedAction::NoActionNeeded {
            reason: "neutral_trigger".into()
        }));
        assert!(!QueueItem::is_schedulable(&SelectedAction::Error {
            reason: "text_generation_failed".into(),
            error: "boom".into()
        }));
        assert!(QueueItem::is_schedulable(&max_retries()));
    }
}
