//! State threaded through the top-level `StateGraph<SupervisorState>` each tick,
//! plus the two reducer functions the distilled spec's `Annotated[...]` fields need.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use flowgraph::channels::Delta;

use super::action::{ActionRecord, QueueItem, SelectedAction};
use super::message::Message;

/// Static facts about the monitored group, fetched once at cold start and cached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupMetadata {
    pub group_id: String,
    pub group_name: String,
    pub topic: String,
    pub member_count: u32,
}

/// Top-level supervisor state. `selected_actions` and `agents_recent_actions` are
/// cleared by the scheduler (C6) every tick after it drains them into the queue/history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorState {
    pub group: GroupMetadata,
    pub conversation_history: Vec<Message>,

    #[serde(default)]
    pub selected_actions: Vec<(String, SelectedAction)>,
    #[serde(default)]
    pub agents_recent_actions: HashMap<String, Vec<ActionRecord>>,

    #[serde(default)]
    pub execution_queue: Vec<QueueItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_request_id: Option<String>,
}

impl SupervisorState {
    pub fn new(group: GroupMetadata, conversation_history: Vec<Message>) -> Self {
        Self {
            group,
            conversation_history,
            selected_actions: Vec::new(),
            agents_recent_actions: HashMap::new(),
            execution_queue: Vec::new(),
            approval_request_id: None,
        }
    }
}

/// Applies the `add_or_clear` reducer semantics to `selected_actions`: a `Clear`
/// delta resets the accumulator (earlier entries in the same batch are dropped),
/// `Append` deltas extend it. Mirrors `flowgraph::channels::ClearableTopic::apply`.
pub fn apply_selected_actions(current: Vec<(String, SelectedAction)>, deltas: Vec<Delta<(String, SelectedAction)>>) -> Vec<(String, SelectedAction)> {
    let mut acc = current;
    for delta in deltas {
        match delta {
            Delta::Clear => acc.clear(),
            Delta::Append(mut items) => acc.append(&mut items),
        }
    }
    acc
}

/// Per-agent-key append merge for `agents_recent_actions`: each incoming map's
/// entries are appended onto the existing per-agent vector, never replacing it.
pub fn merge_agent_actions(current: &mut HashMap<String, Vec<ActionRecord>>, incoming: &HashMap<String, Vec<ActionRecord>>) {
    for (agent, records) in incoming {
        current.entry(agent.clone()).or_default().extend(records.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::action::TargetMessage;

    fn record(agent: &str) -> ActionRecord {
        ActionRecord {
            agent_name: agent.to_string(),
            agent_type: "coach".into(),
            action_id: "nudge".into(),
            purpose: "encourage".into(),
            styled_response: "go on!".into(),
            trigger_id: "struggling".into(),
            trigger_justification: "said it's hard".into(),
            target_message: TargetMessage {
                timestamp: "2025-01-01T00:00:00.000Z".into(),
                text: "hard".into(),
            },
            timestamp: "2025-01-01T00:00:01.000Z".into(),
        }
    }

    #[test]
    fn clear_resets_before_later_appends_in_same_batch() {
        let current = vec![("a".to_string(), SelectedAction::NoActionNeeded { reason: "x".into() })];
        let deltas = vec![
            Delta::Clear,
            Delta::Append(vec![("b".to_string(), SelectedAction::NoActionNeeded { reason: "y".into() })]),
        ];
        let result = apply_selected_actions(current, deltas);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, "b");
    }

    #[test]
    fn agent_actions_merge_appends_per_key() {
        let mut current: HashMap<String, Vec<ActionRecord>> = HashMap::new();
        current.insert("Alex".to_string(), vec![record("Alex")]);

        let mut incoming: HashMap<String, Vec<ActionRecord>> = HashMap::new();
        incoming.insert("Alex".to_string(), vec![record("Alex")]);
        incoming.insert("Sam".to_string(), vec![record("Sam")]);

        merge_agent_actions(&mut current, &incoming);

        assert_eq!(current.get("Alex").unwrap().len(), 2);
        assert_eq!(current.get("Sam").unwrap().len(), 1);
    }
}
