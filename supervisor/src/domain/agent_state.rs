//! State threaded through one persona's agent subgraph (C4) for a single tick.

use serde::{Deserialize, Serialize};

use super::action::{ActionCatalog, DetectedTrigger, SelectedAction, TriggerCatalog};
use super::message::Message;
use super::persona::Persona;

/// Input/working state for one persona's `StateGraph<AgentState>` run. Built fresh
/// per persona per tick by the `persona_fanout` node; never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub persona: Persona,
    pub triggers: TriggerCatalog,
    pub actions: ActionCatalog,

    pub conversation_history: Vec<Message>,
    pub target_message: Message,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_trigger: Option<DetectedTrigger>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_action_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_action_purpose: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styled_response: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_feedback: Option<String>,
    #[serde(default)]
    pub retry_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_action: Option<SelectedAction>,
}

impl AgentState {
    pub fn new(persona: Persona, triggers: TriggerCatalog, actions: ActionCatalog, conversation_history: Vec<Message>, target_message: Message) -> Self {
        Self {
            persona,
            triggers,
            actions,
            conversation_history,
            target_message,
            detected_trigger: None,
            chosen_action_id: None,
            chosen_action_purpose: None,
            raw_response: None,
            styled_response: None,
            validation_feedback: None,
            retry_count: 0,
            selected_action: None,
        }
    }
}
