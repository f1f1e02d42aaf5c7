//! Agent subgraph (C4): one persona's trigger-detect → decide → draft → style →
//! validate pipeline, run once per tick per eligible persona by `persona_fanout`.
//!
//! Every node is free to end the run early by setting `state.selected_action` —
//! the shared conditional router downstream of each node checks exactly that flag
//! and routes to `END` when it's set, or to the next node in the chain otherwise.
//! `validator` is the one node that can route backwards, to `text_generator`, when
//! a retry is still available.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use flowgraph::error::NodeError;
use flowgraph::graph::{CompiledStateGraph, Next, Node, StateGraph, END, START};

use crate::domain::{ActionCatalog, AgentState, SelectedAction, TargetMessage, TriggerDefinition};
use crate::format::{format_message_for_prompt, FormatOptions};
use crate::llm::LlmClient;
use crate::prompts;
use crate::settings::ModelSettings;

/// Rejections a styled response can survive before the validator auto-approves it.
const MAX_RETRIES: u32 = 3;

/// Builds the compiled per-persona subgraph, one `LlmClient` shared by every node.
pub fn build(llm: Arc<dyn LlmClient>, models: &AgentGraphModels) -> Result<CompiledStateGraph<AgentState>, flowgraph::graph::CompilationError> {
    let mut graph = StateGraph::<AgentState>::new();

    graph.add_node("trigger_analysis", Arc::new(TriggerAnalysis::new(llm.clone(), models.trigger_analysis.clone())));
    graph.add_node("decision_maker", Arc::new(DecisionMaker::new(llm.clone(), models.decision_maker.clone())));
    graph.add_node("text_generator", Arc::new(TextGenerator::new(llm.clone(), models.text_generator.clone())));
    graph.add_node("styler", Arc::new(Styler::new(llm.clone(), models.styler.clone())));
    graph.add_node("validator", Arc::new(Validator::new(llm, models.validator.clone())));

    graph.add_edge(START, "trigger_analysis");
    graph.add_conditional_edges("trigger_analysis", terminal_router("decision_maker"), None);
    graph.add_conditional_edges("decision_maker", terminal_router("text_generator"), None);
    graph.add_conditional_edges("text_generator", terminal_router("styler"), None);
    graph.add_conditional_edges("styler", terminal_router("validator"), None);
    graph.add_conditional_edges("validator", terminal_router("text_generator"), None);

    graph.compile()
}

/// Per-node model/temperature, resolved once at supervisor-graph build time from
/// `Settings::model_for_node`.
#[derive(Debug, Clone)]
pub struct AgentGraphModels {
    pub trigger_analysis: ModelSettings,
    pub decision_maker: ModelSettings,
    pub text_generator: ModelSettings,
    pub styler: ModelSettings,
    pub validator: ModelSettings,
}

/// Every node but `validator` shares the same routing shape: terminal when
/// `selected_action` is set, otherwise continue to a fixed next node.
fn terminal_router(next: &'static str) -> flowgraph::graph::conditional::ConditionalRouterFn<AgentState> {
    Arc::new(move |state: &AgentState| if state.selected_action.is_some() { END.to_string() } else { next.to_string() })
}

fn conversation_block(state: &AgentState) -> String {
    state
        .conversation_history
        .iter()
        .map(|m| format_message_for_prompt(m, FormatOptions::default(), std::slice::from_ref(&state.persona), Some(&state.persona), Some(&state.conversation_history)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn target_message_line(state: &AgentState) -> String {
    format_message_for_prompt(&state.target_message, FormatOptions::default(), std::slice::from_ref(&state.persona), Some(&state.persona), Some(&state.conversation_history))
}

/// The target message to carry in the final `SelectedAction`: the trigger's own
/// `target_message` when the model pointed at a different message, otherwise the
/// default target (the message `persona_fanout` handed this run).
fn target_message_record(state: &AgentState) -> TargetMessage {
    state
        .detected_trigger
        .as_ref()
        .and_then(|t| t.target_message.clone())
        .unwrap_or_else(|| TargetMessage {
            timestamp: state.target_message.timestamp.clone(),
            text: state.target_message.text.clone(),
        })
}

fn triggers_block(catalog: &crate::domain::TriggerCatalog) -> String {
    catalog
        .triggers
        .iter()
        .map(|t| format!("- {}: {} (suggests: {})", t.id, t.description, t.suggested_action_ids.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn suggested_actions_block(actions: &ActionCatalog, trigger: &TriggerDefinition) -> String {
    let ids: Vec<&str> = if trigger.suggested_action_ids.is_empty() {
        actions.actions.iter().map(|a| a.id.as_str()).collect()
    } else {
        trigger.suggested_action_ids.iter().map(|s| s.as_str()).collect()
    };
    ids.iter()
        .filter_map(|id| actions.find(id))
        .map(|a| format!("- {}: {} - {}", a.id, a.purpose, a.description))
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// trigger_analysis
// ---------------------------------------------------------------------------

const TRIGGER_SYSTEM_PROMPT: &str = "You are a trigger-detection assistant for one persona in a group chat supervisor.";

#[derive(Deserialize)]
struct TriggerResponse {
    trigger_id: String,
    justification: String,
    #[serde(default)]
    target_message: Option<TargetMessage>,
}

pub struct TriggerAnalysis {
    llm: Arc<dyn LlmClient>,
    model: ModelSettings,
}

impl TriggerAnalysis {
    pub fn new(llm: Arc<dyn LlmClient>, model: ModelSettings) -> Self {
        Self { llm, model }
    }
}

#[async_trait]
impl Node<AgentState> for TriggerAnalysis {
    fn id(&self) -> &str {
        "trigger_analysis"
    }

    async fn run(&self, mut state: AgentState) -> Result<(AgentState, Next), NodeError> {
        if state.conversation_history.is_empty() {
            state.selected_action = Some(SelectedAction::NoActionNeeded {
                reason: "no_conversation_history".to_string(),
            });
            return Ok((state, Next::Continue));
        }
        if state.triggers.triggers.is_empty() {
            state.selected_action = Some(SelectedAction::Error {
                reason: "missing_triggers_catalog".to_string(),
                error: "persona has no triggers configured".to_string(),
            });
            return Ok((state, Next::Continue));
        }

        let mut vars = HashMap::new();
        vars.insert("agent_name", state.persona.agent_name.clone());
        vars.insert("agent_type", state.persona.agent_type.clone());
        vars.insert("persona_description", state.persona.persona_description.clone());
        vars.insert("triggers", triggers_block(&state.triggers));
        vars.insert("conversation_history", conversation_block(&state));
        vars.insert("target_message", target_message_line(&state));
        let user_prompt = prompts::render(prompts::TRIGGER_ANALYSIS, &vars);

        match self.llm.complete(TRIGGER_SYSTEM_PROMPT, &user_prompt, &self.model.model, self.model.temperature).await {
            Ok(raw) => match serde_json::from_str::<TriggerResponse>(&raw) {
                Ok(parsed) => {
                    if parsed.trigger_id == "neutral" {
                        state.selected_action = Some(SelectedAction::NoActionNeeded {
                            reason: "neutral_trigger".to_string(),
                        });
                    } else if parsed.trigger_id == "ERROR" {
                        state.selected_action = Some(SelectedAction::Error {
                            reason: "trigger_analysis_error".to_string(),
                            error: parsed.justification.clone(),
                        });
                    }
                    state.detected_trigger = Some(crate::domain::DetectedTrigger {
                        trigger_id: parsed.trigger_id,
                        justification: parsed.justification,
                        target_message: parsed.target_message,
                    });
                }
                Err(e) => {
                    tracing::warn!(agent = %state.persona.agent_name, error = %e, "trigger_analysis: could not parse model response");
                    state.selected_action = Some(SelectedAction::Error {
                        reason: "trigger_analysis_failed".to_string(),
                        error: format!("invalid JSON from model: {e}"),
                    });
                }
            },
            Err(e) => {
                tracing::warn!(agent = %state.persona.agent_name, error = %e, "trigger_analysis: model call failed");
                state.selected_action = Some(SelectedAction::Error {
                    reason: "trigger_analysis_failed".to_string(),
                    error: e.to_string(),
                });
            }
        }

        Ok((state, Next::Continue))
    }
}

// ---------------------------------------------------------------------------
// decision_maker
// ---------------------------------------------------------------------------

const DECISION_SYSTEM_PROMPT: &str = "You are an action-selection assistant for one persona in a group chat supervisor.";

#[derive(Deserialize)]
struct DecisionResponse {
    id: String,
    purpose: String,
}

pub struct DecisionMaker {
    llm: Arc<dyn LlmClient>,
    model: ModelSettings,
}

impl DecisionMaker {
    pub fn new(llm: Arc<dyn LlmClient>, model: ModelSettings) -> Self {
        Self { llm, model }
    }
}

#[async_trait]
impl Node<AgentState> for DecisionMaker {
    fn id(&self) -> &str {
        "decision_maker"
    }

    async fn run(&self, mut state: AgentState) -> Result<(AgentState, Next), NodeError> {
        let Some(trigger) = state.detected_trigger.clone() else {
            state.selected_action = Some(SelectedAction::Error {
                reason: "decision_maker_missing_trigger".to_string(),
                error: "decision_maker reached with no detected trigger".to_string(),
            });
            return Ok((state, Next::Continue));
        };

        let catalog_trigger = state.triggers.find(&trigger.trigger_id).cloned();
        let suggested_actions = match &catalog_trigger {
            Some(t) => suggested_actions_block(&state.actions, t),
            None => {
                tracing::warn!(trigger_id = %trigger.trigger_id, "decision_maker: trigger not found in catalog, offering full action list");
                suggested_actions_block(
                    &state.actions,
                    &TriggerDefinition {
                        id: trigger.trigger_id.clone(),
                        description: String::new(),
                        suggested_action_ids: vec![],
                    },
                )
            }
        };

        let mut vars = HashMap::new();
        vars.insert("agent_name", state.persona.agent_name.clone());
        vars.insert("agent_type", state.persona.agent_type.clone());
        vars.insert("persona_description", state.persona.persona_description.clone());
        vars.insert("trigger_id", trigger.trigger_id.clone());
        vars.insert("trigger_justification", trigger.justification.clone());
        vars.insert("suggested_actions", suggested_actions);
        let user_prompt = prompts::render(prompts::DECISION_MAKER, &vars);

        let decision = self.llm.complete(DECISION_SYSTEM_PROMPT, &user_prompt, &self.model.model, self.model.temperature).await;

        match decision {
            Ok(raw) => match serde_json::from_str::<DecisionResponse>(&raw) {
                Ok(parsed) if !parsed.id.trim().is_empty() => {
                    if catalog_trigger.as_ref().map(|t| !t.suggested_action_ids.is_empty() && !t.suggested_action_ids.contains(&parsed.id)).unwrap_or(false) {
                        tracing::warn!(action_id = %parsed.id, trigger_id = %trigger.trigger_id, "decision_maker: chosen action was not in the suggested set, honoring it anyway");
                    }
                    state.chosen_action_id = Some(parsed.id);
                    state.chosen_action_purpose = Some(parsed.purpose);
                }
                _ => {
                    state.selected_action = Some(SelectedAction::NoActionNeeded {
                        reason: "no_action_picked".to_string(),
                    });
                }
            },
            Err(e) => {
                tracing::warn!(agent = %state.persona.agent_name, error = %e, "decision_maker: model call failed");
                state.selected_action = Some(SelectedAction::NoActionNeeded {
                    reason: "no_action_picked".to_string(),
                });
            }
        }

        Ok((state, Next::Continue))
    }
}

// ---------------------------------------------------------------------------
// text_generator
// ---------------------------------------------------------------------------

const TEXT_GENERATOR_SYSTEM_PROMPT: &str = "You are a drafting assistant writing the raw content for one persona's action in a group chat supervisor.";

pub struct TextGenerator {
    llm: Arc<dyn LlmClient>,
    model: ModelSettings,
}

impl TextGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, model: ModelSettings) -> Self {
        Self { llm, model }
    }
}

#[async_trait]
impl Node<AgentState> for TextGenerator {
    fn id(&self) -> &str {
        "text_generator"
    }

    async fn run(&self, mut state: AgentState) -> Result<(AgentState, Next), NodeError> {
        let (Some(action_id), Some(action_purpose)) = (state.chosen_action_id.clone(), state.chosen_action_purpose.clone()) else {
            state.selected_action = Some(SelectedAction::Error {
                reason: "text_generator_missing_action".to_string(),
                error: "text_generator reached with no chosen action".to_string(),
            });
            return Ok((state, Next::Continue));
        };

        let validation_feedback = match &state.validation_feedback {
            Some(feedback) => format!("Your previous attempt was rejected: {feedback}\n\nRewrite it to address this feedback."),
            None => String::new(),
        };

        let mut vars = HashMap::new();
        vars.insert("agent_name", state.persona.agent_name.clone());
        vars.insert("agent_type", state.persona.agent_type.clone());
        vars.insert("persona_description", state.persona.persona_description.clone());
        vars.insert("agent_goal", state.persona.agent_goal.clone());
        vars.insert("action_id", action_id);
        vars.insert("action_purpose", action_purpose);
        vars.insert("target_message", target_message_line(&state));
        vars.insert("conversation_history", conversation_block(&state));
        vars.insert("validation_feedback", validation_feedback);
        let user_prompt = prompts::render(prompts::TEXT_GENERATOR, &vars);

        match self.llm.complete(TEXT_GENERATOR_SYSTEM_PROMPT, &user_prompt, &self.model.model, self.model.temperature).await {
            Ok(raw) if !raw.trim().is_empty() => {
                state.raw_response = Some(raw);
            }
            Ok(_) => {
                state.selected_action = Some(SelectedAction::Error {
                    reason: "text_generation_failed".to_string(),
                    error: "model returned an empty draft".to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(agent = %state.persona.agent_name, error = %e, "text_generator: model call failed");
                state.selected_action = Some(SelectedAction::Error {
                    reason: "text_generation_failed".to_string(),
                    error: e.to_string(),
                });
            }
        }

        Ok((state, Next::Continue))
    }
}

// ---------------------------------------------------------------------------
// styler
// ---------------------------------------------------------------------------

const STYLER_SYSTEM_PROMPT: &str = "You rewrite a drafted response in one persona's own voice, keeping its meaning intact.";

pub struct Styler {
    llm: Arc<dyn LlmClient>,
    model: ModelSettings,
}

impl Styler {
    pub fn new(llm: Arc<dyn LlmClient>, model: ModelSettings) -> Self {
        Self { llm, model }
    }
}

#[async_trait]
impl Node<AgentState> for Styler {
    fn id(&self) -> &str {
        "styler"
    }

    async fn run(&self, mut state: AgentState) -> Result<(AgentState, Next), NodeError> {
        let Some(raw_response) = state.raw_response.clone() else {
            state.selected_action = Some(SelectedAction::Error {
                reason: "styler_missing_draft".to_string(),
                error: "styler reached with no raw response".to_string(),
            });
            return Ok((state, Next::Continue));
        };

        let mut vars = HashMap::new();
        vars.insert("agent_name", state.persona.agent_name.clone());
        vars.insert("agent_type", state.persona.agent_type.clone());
        vars.insert("persona_description", state.persona.persona_description.clone());
        vars.insert("raw_response", raw_response);
        let user_prompt = prompts::render(prompts::STYLER, &vars);

        match self.llm.complete(STYLER_SYSTEM_PROMPT, &user_prompt, &self.model.model, self.model.temperature).await {
            Ok(raw) if !raw.trim().is_empty() => {
                state.styled_response = Some(raw);
            }
            Ok(_) => {
                state.selected_action = Some(SelectedAction::Error {
                    reason: "styling_failed".to_string(),
                    error: "model returned an empty styled response".to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(agent = %state.persona.agent_name, error = %e, "styler: model call failed");
                state.selected_action = Some(SelectedAction::Error {
                    reason: "styling_failed".to_string(),
                    error: e.to_string(),
                });
            }
        }

        Ok((state, Next::Continue))
    }
}

// ---------------------------------------------------------------------------
// validator
// ---------------------------------------------------------------------------

const VALIDATOR_SYSTEM_PROMPT: &str = "You are a strict reviewer deciding whether a styled response is ready to send.";

#[derive(Deserialize)]
struct ValidatorResponse {
    approved: bool,
    reason: String,
}

pub struct Validator {
    llm: Arc<dyn LlmClient>,
    model: ModelSettings,
}

impl Validator {
    pub fn new(llm: Arc<dyn LlmClient>, model: ModelSettings) -> Self {
        Self { llm, model }
    }

    fn finalize(&self, state: &AgentState, validation_note: Option<String>) -> SelectedAction {
        let trigger = state.detected_trigger.clone().unwrap_or(crate::domain::DetectedTrigger {
            trigger_id: String::new(),
            justification: String::new(),
            target_message: None,
        });
        let action_id = state.chosen_action_id.clone().unwrap_or_default();
        let purpose = state.chosen_action_purpose.clone().unwrap_or_default();
        let styled_response = state.styled_response.clone().unwrap_or_default();
        let target_message = target_message_record(state);

        match validation_note {
            None => SelectedAction::Success {
                action_id,
                purpose,
                styled_response,
                agent_type: state.persona.agent_type.clone(),
                agent_name: state.persona.agent_name.clone(),
                phone_number: state.persona.phone_number.clone(),
                trigger_id: trigger.trigger_id,
                trigger_justification: trigger.justification,
                target_message,
                retry_count: state.retry_count,
            },
            Some(note) => SelectedAction::MaxRetriesReached {
                action_id,
                purpose,
                styled_response,
                agent_type: state.persona.agent_type.clone(),
                agent_name: state.persona.agent_name.clone(),
                phone_number: state.persona.phone_number.clone(),
                trigger_id: trigger.trigger_id,
                trigger_justification: trigger.justification,
                target_message,
                validation_note: note,
                retry_count: state.retry_count,
            },
        }
    }
}

#[async_trait]
impl Node<AgentState> for Validator {
    fn id(&self) -> &str {
        "validator"
    }

    async fn run(&self, mut state: AgentState) -> Result<(AgentState, Next), NodeError> {
        if state.retry_count >= MAX_RETRIES {
            state.selected_action = Some(self.finalize(&state, Some("auto-approved after exhausting retries".to_string())));
            state.retry_count = 0;
            return Ok((state, Next::Continue));
        }

        let action_id = state.chosen_action_id.clone().unwrap_or_default();
        let action_purpose = state.chosen_action_purpose.clone().unwrap_or_default();
        let styled_response = match state.styled_response.clone() {
            Some(s) => s,
            None => {
                state.selected_action = Some(SelectedAction::Error {
                    reason: "validator_missing_styled_response".to_string(),
                    error: "validator reached with no styled response".to_string(),
                });
                return Ok((state, Next::Continue));
            }
        };

        let mut vars = HashMap::new();
        vars.insert("agent_name", state.persona.agent_name.clone());
        vars.insert("agent_type", state.persona.agent_type.clone());
        vars.insert("action_id", action_id);
        vars.insert("action_purpose", action_purpose);
        vars.insert("target_message", target_message_line(&state));
        vars.insert("styled_response", styled_response);
        let user_prompt = prompts::render(prompts::VALIDATOR, &vars);

        match self.llm.complete(VALIDATOR_SYSTEM_PROMPT, &user_prompt, &self.model.model, self.model.temperature).await {
            Ok(raw) => match serde_json::from_str::<ValidatorResponse>(&raw) {
                Ok(parsed) if parsed.approved => {
                    state.selected_action = Some(self.finalize(&state, None));
                    state.validation_feedback = None;
                    state.retry_count = 0;
                }
                Ok(parsed) => {
                    state.validation_feedback = Some(parsed.reason);
                    state.retry_count += 1;
                }
                Err(e) => {
                    tracing::warn!(agent = %state.persona.agent_name, error = %e, "validator: could not parse model response");
                    state.validation_feedback = Some("the validator's response could not be parsed".to_string());
                    state.retry_count += 1;
                }
            },
            Err(e) => {
                tracing::warn!(agent = %state.persona.agent_name, error = %e, "validator: model call failed");
                state.validation_feedback = Some(format!("validator call failed: {e}"));
                state.retry_count += 1;
            }
        }

        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActionCatalog, ActionDefinition, Message, Persona, TriggerCatalog};
    use crate::llm::MockLlmClient;

    fn persona() -> Persona {
        Persona {
            agent_name: "Alex".into(),
            agent_type: "coach".into(),
            phone_number: "+1555".into(),
            user_name: "alex".into(),
            first_name: "Alex".into(),
            last_name: "".into(),
            agent_goal: "keep the group motivated".into(),
            persona_description: "upbeat and direct".into(),
            triggers_path: "t.json".into(),
            actions_path: "a.json".into(),
        }
    }

    fn triggers() -> TriggerCatalog {
        TriggerCatalog {
            triggers: vec![TriggerDefinition {
                id: "struggling".into(),
                description: "member expresses difficulty".into(),
                suggested_action_ids: vec!["nudge".into()],
            }],
        }
    }

    fn actions() -> ActionCatalog {
        ActionCatalog {
            actions: vec![ActionDefinition {
                id: "nudge".into(),
                purpose: "encourage".into(),
                description: "send an encouraging nudge".into(),
            }],
        }
    }

    fn message(id: &str, text: &str) -> Message {
        Message {
            message_id: id.into(),
            sender_id: "u1".into(),
            sender_username: "bob".into(),
            sender_first_name: "".into(),
            sender_last_name: "".into(),
            text: text.into(),
            date: chrono::Utc::now(),
            timestamp: "2025-01-01T00:00:00.000Z".into(),
            reactions: vec![],
            reply_to_message_id: None,
            message_emotion: None,
            sender_personality: None,
            processed: false,
        }
    }

    fn agent_state() -> AgentState {
        AgentState::new(persona(), triggers(), actions(), vec![message("1", "this is hard")], message("1", "this is hard"))
    }

    fn model() -> ModelSettings {
        ModelSettings {
            model: "gpt-5-nano".into(),
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn trigger_analysis_ends_no_op_on_empty_history() {
        let mut state = agent_state();
        state.conversation_history.clear();
        let llm = Arc::new(MockLlmClient::fixed("unused"));
        let node = TriggerAnalysis::new(llm.clone(), model());
        let (out, _) = node.run(state).await.unwrap();
        assert!(matches!(out.selected_action, Some(SelectedAction::NoActionNeeded { .. })));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn trigger_analysis_neutral_ends_no_op() {
        let llm = Arc::new(MockLlmClient::fixed(r#"{"trigger_id":"neutral","justification":"nothing notable"}"#));
        let node = TriggerAnalysis::new(llm, model());
        let (out, _) = node.run(agent_state()).await.unwrap();
        assert!(matches!(out.selected_action, Some(SelectedAction::NoActionNeeded { .. })));
    }

    #[tokio::test]
    async fn trigger_analysis_non_neutral_continues() {
        let llm = Arc::new(MockLlmClient::fixed(r#"{"trigger_id":"struggling","justification":"said it's hard"}"#));
        let node = TriggerAnalysis::new(llm, model());
        let (out, _) = node.run(agent_state()).await.unwrap();
        assert!(out.selected_action.is_none());
        assert_eq!(out.detected_trigger.unwrap().trigger_id, "struggling");
    }

    #[tokio::test]
    async fn trigger_analysis_captures_target_message() {
        let llm = Arc::new(MockLlmClient::fixed(
            r#"{"trigger_id":"struggling","justification":"said it's hard","target_message":{"timestamp":"2025-11-26 08:36:07","text":"cool"}}"#,
        ));
        let node = TriggerAnalysis::new(llm, model());
        let (out, _) = node.run(agent_state()).await.unwrap();
        let trigger = out.detected_trigger.unwrap();
        let target = trigger.target_message.unwrap();
        assert_eq!(target.timestamp, "2025-11-26 08:36:07");
        assert_eq!(target.text, "cool");
    }

    #[tokio::test]
    async fn finalize_prefers_detected_trigger_target_message_over_default() {
        let mut state = validator_ready_state();
        state.detected_trigger.as_mut().unwrap().target_message = Some(TargetMessage {
            timestamp: "2025-11-26T08:36:07.000Z".into(),
            text: "cool".into(),
        });
        let llm = Arc::new(MockLlmClient::fixed(r#"{"approved":true,"reason":"on point"}"#));
        let node = Validator::new(llm, model());
        let (out, _) = node.run(state).await.unwrap();
        match out.selected_action {
            Some(SelectedAction::Success { target_message, .. }) => {
                assert_eq!(target_message.timestamp, "2025-11-26T08:36:07.000Z");
                assert_eq!(target_message.text, "cool");
            }
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn decision_maker_picks_action_and_continues() {
        let mut state = agent_state();
        state.detected_trigger = Some(crate::domain::DetectedTrigger {
            trigger_id: "struggling".into(),
            justification: "said it's hard".into(),
            target_message: None,
        });
        let llm = Arc::new(MockLlmClient::fixed(r#"{"id":"nudge","purpose":"encourage them"}"#));
        let node = DecisionMaker::new(llm, model());
        let (out, _) = node.run(state).await.unwrap();
        assert!(out.selected_action.is_none());
        assert_eq!(out.chosen_action_id.as_deref(), Some("nudge"));
    }

    #[tokio::test]
    async fn decision_maker_empty_id_ends_no_op() {
        let mut state = agent_state();
        state.detected_trigger = Some(crate::domain::DetectedTrigger {
            trigger_id: "struggling".into(),
            justification: "said it's hard".into(),
            target_message: None,
        });
        let llm = Arc::new(MockLlmClient::fixed(r#"{"id":"","purpose":""}"#));
        let node = DecisionMaker::new(llm, model());
        let (out, _) = node.run(state).await.unwrap();
        assert!(matches!(out.selected_action, Some(SelectedAction::NoActionNeeded { .. })));
    }

    #[tokio::test]
    async fn text_generator_fills_raw_response() {
        let mut state = agent_state();
        state.chosen_action_id = Some("nudge".into());
        state.chosen_action_purpose = Some("encourage them".into());
        let llm = Arc::new(MockLlmClient::fixed("You've got this, keep pushing."));
        let node = TextGenerator::new(llm, model());
        let (out, _) = node.run(state).await.unwrap();
        assert!(out.selected_action.is_none());
        assert_eq!(out.raw_response.as_deref(), Some("You've got this, keep pushing."));
    }

    #[tokio::test]
    async fn text_generator_empty_draft_is_an_error() {
        let mut state = agent_state();
        state.chosen_action_id = Some("nudge".into());
        state.chosen_action_purpose = Some("encourage them".into());
        let llm = Arc::new(MockLlmClient::fixed("   "));
        let node = TextGenerator::new(llm, model());
        let (out, _) = node.run(state).await.unwrap();
        assert!(matches!(out.selected_action, Some(SelectedAction::Error { .. })));
    }

    #[tokio::test]
    async fn styler_fills_styled_response() {
        let mut state = agent_state();
        state.raw_response = Some("You've got this.".into());
        let llm = Arc::new(MockLlmClient::fixed("Hey champ, you've absolutely got this!"));
        let node = Styler::new(llm, model());
        let (out, _) = node.run(state).await.unwrap();
        assert!(out.selected_action.is_none());
        assert!(out.styled_response.is_some());
    }

    fn validator_ready_state() -> AgentState {
        let mut state = agent_state();
        state.detected_trigger = Some(crate::domain::DetectedTrigger {
            trigger_id: "struggling".into(),
            justification: "said it's hard".into(),
            target_message: None,
        });
        state.chosen_action_id = Some("nudge".into());
        state.chosen_action_purpose = Some("encourage them".into());
        state.styled_response = Some("Hey champ, you've got this!".into());
        state
    }

    #[tokio::test]
    async fn validator_approves_and_resets_retry_count() {
        let mut state = validator_ready_state();
        state.retry_count = 1;
        let llm = Arc::new(MockLlmClient::fixed(r#"{"approved":true,"reason":"on point"}"#));
        let node = Validator::new(llm, model());
        let (out, _) = node.run(state).await.unwrap();
        assert!(matches!(out.selected_action, Some(SelectedAction::Success { .. })));
        assert_eq!(out.retry_count, 0);
    }

    #[tokio::test]
    async fn validator_rejection_increments_retry_and_loops() {
        let state = validator_ready_state();
        let llm = Arc::new(MockLlmClient::fixed(r#"{"approved":false,"reason":"too pushy"}"#));
        let node = Validator::new(llm, model());
        let (out, _) = node.run(state).await.unwrap();
        assert!(out.selected_action.is_none());
        assert_eq!(out.retry_count, 1);
        assert_eq!(out.validation_feedback.as_deref(), Some("too pushy"));
    }

    #[tokio::test]
    async fn validator_auto_approves_at_max_retries_without_calling_model() {
        let mut state = validator_ready_state();
        state.retry_count = MAX_RETRIES;
        let llm = Arc::new(MockLlmClient::fixed("unused"));
        let node = Validator::new(llm.clone(), model());
        let (out, _) = node.run(state).await.unwrap();
        assert!(matches!(out.selected_action, Some(SelectedAction::MaxRetriesReached { .. })));
        assert_eq!(out.retry_count, 0);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn validator_parse_failure_increments_retry() {
        let state = validator_ready_state();
        let llm = Arc::new(MockLlmClient::fixed("not json"));
        let node = Validator::new(llm, model());
        let (out, _) = node.run(state).await.unwrap();
        assert!(out.selected_action.is_none());
        assert_eq!(out.retry_count, 1);
    }

    fn models() -> AgentGraphModels {
        AgentGraphModels {
            trigger_analysis: model(),
            decision_maker: model(),
            text_generator: model(),
            styler: model(),
            validator: model(),
        }
    }

    #[tokio::test]
    async fn full_subgraph_runs_neutral_trigger_straight_to_end() {
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlmClient::fixed(r#"{"trigger_id":"neutral","justification":"nothing notable"}"#));
        let compiled = build(llm, &models()).unwrap();
        let result = compiled.invoke(agent_state(), None).await.unwrap();
        assert!(matches!(result.selected_action, Some(SelectedAction::NoActionNeeded { .. })));
    }

    #[tokio::test]
    async fn full_subgraph_runs_end_to_end_to_success() {
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlmClient::scripted(vec![
            r#"{"trigger_id":"struggling","justification":"said it's hard"}"#.into(),
            r#"{"id":"nudge","purpose":"encourage them"}"#.into(),
            "You've got this.".into(),
            "Hey champ, you've got this!".into(),
            r#"{"approved":true,"reason":"on point"}"#.into(),
        ]));
        let compiled = build(llm, &models()).unwrap();
        let result = compiled.invoke(agent_state(), None).await.unwrap();
        assert!(matches!(result.selected_action, Some(SelectedAction::Success { .. })));
    }

    #[tokio::test]
    async fn full_subgraph_retries_then_succeeds() {
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlmClient::scripted(vec![
            r#"{"trigger_id":"struggling","justification":"said it's hard"}"#.into(),
            r#"{"id":"nudge","purpose":"encourage them"}"#.into(),
            "You've got this.".into(),
            "Hey champ, you've got this!".into(),
            r#"{"approved":false,"reason":"too pushy"}"#.into(),
            "Rewritten draft.".into(),
            "Softer, rewritten.".into(),
            r#"{"approved":true,"reason":"better"}"#.into(),
        ]));
        let compiled = build(llm, &models()).unwrap();
        let result = compiled.invoke(agent_state(), None).await.unwrap();
        match result.selected_action {
            Some(SelectedAction::Success { retry_count, .. }) => assert_eq!(retry_count, 1),
            other => panic!("expected Success, got {other:?}"),
        }
    }
}
