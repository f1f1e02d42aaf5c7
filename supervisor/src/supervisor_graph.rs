//! Supervisor Graph (C5): composes emotion analysis → personality analysis →
//! per-persona fan-out → scheduler → (optional) human-approval gate → executor,
//! as a `flowgraph::StateGraph<SupervisorState>`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use flowgraph::error::NodeError;
use flowgraph::graph::{CompiledStateGraph, Next, Node, StateGraph, END, START};
use flowgraph::memory::Checkpointer;

use crate::agent_graph;
use crate::domain::{merge_agent_actions, ActionCatalog, ActionRecord, AgentState, Persona, SelectedAction, SupervisorState, TargetMessage, TriggerCatalog};
use crate::emotion::analyze_emotion;
use crate::executor::Executor;
use crate::human_approval::HumanApprovalGate;
use crate::llm::LlmClient;
use crate::memory::{MemoryStore, PersonalitySnapshot};
use crate::personality::{analyze_user_personality, attach_personality_to_messages, should_skip_user};
use crate::scheduler::Scheduler;
use crate::settings::{ModelSettings, PersonalityAnalysisSettings, Settings};
use crate::transport::ChatTransport;

/// One persona's static config plus its pre-compiled agent subgraph, built once at
/// cold start and reused across ticks.
pub struct PersonaRuntime {
    pub persona: Persona,
    pub triggers: TriggerCatalog,
    pub actions: ActionCatalog,
    pub subgraph: CompiledStateGraph<AgentState>,
}

/// Builds the compiled supervisor graph. `checkpointer` is required for C7's
/// interrupt/resume to function when `hitl.enabled`.
pub fn build(
    llm: Arc<dyn LlmClient>,
    transport: Arc<dyn ChatTransport>,
    memory: Arc<dyn MemoryStore>,
    ipc: crate::memory::ApprovalIpc,
    settings: &Settings,
    personas: Vec<PersonaRuntime>,
    checkpointer: Arc<dyn Checkpointer<SupervisorState>>,
) -> Result<CompiledStateGraph<SupervisorState>, flowgraph::graph::CompilationError> {
    let mut graph = StateGraph::<SupervisorState>::new();

    graph.add_node(
        "emotion_analysis",
        Arc::new(EmotionAnalysisNode {
            llm: llm.clone(),
            model: settings.model_for_node("emotion_analysis"),
        }),
    );
    graph.add_node(
        "personality_analysis",
        Arc::new(PersonalityAnalysisNode {
            llm: llm.clone(),
            memory: memory.clone(),
            chat_id: settings.chat_id.clone(),
            all_personas: settings.personas(),
            settings: settings.personality_analysis.clone(),
            model: settings.model_for_node("personality_analysis"),
        }),
    );
    graph.add_node("persona_fanout", Arc::new(PersonaFanout { personas }));
    graph.add_node("scheduler", Arc::new(Scheduler::new()));
    graph.add_node("human_approval", Arc::new(HumanApprovalGate::new(ipc, settings.hitl.enabled)));
    graph.add_node("executor", Arc::new(Executor::new(transport)));

    graph.add_edge(START, "emotion_analysis");
    graph.add_edge("emotion_analysis", "personality_analysis");
    graph.add_edge("personality_analysis", "persona_fanout");
    graph.add_edge("persona_fanout", "scheduler");
    graph.add_edge("scheduler", "human_approval");
    graph.add_edge("human_approval", "executor");
    graph.add_edge("executor", END);

    graph.compile_with_checkpointer(checkpointer)
}

// ---------------------------------------------------------------------------
// emotion_analysis
// ---------------------------------------------------------------------------

struct EmotionAnalysisNode {
    llm: Arc<dyn LlmClient>,
    model: ModelSettings,
}

#[async_trait]
impl Node<SupervisorState> for EmotionAnalysisNode {
    fn id(&self) -> &str {
        "emotion_analysis"
    }

    async fn run(&self, mut state: SupervisorState) -> Result<(SupervisorState, Next), NodeError> {
        let sentiment = analyze_emotion(self.llm.as_ref(), &state.group, &mut state.conversation_history, &self.model.model, self.model.temperature).await;
        tracing::debug!(sentiment = %sentiment, "emotion analysis complete");
        Ok((state, Next::Continue))
    }
}

// ---------------------------------------------------------------------------
// personality_analysis
// ---------------------------------------------------------------------------

struct PersonalityAnalysisNode {
    llm: Arc<dyn LlmClient>,
    memory: Arc<dyn MemoryStore>,
    chat_id: String,
    all_personas: Vec<Persona>,
    settings: PersonalityAnalysisSettings,
    model: ModelSettings,
}

#[async_trait]
impl Node<SupervisorState> for PersonalityAnalysisNode {
    fn id(&self) -> &str {
        "personality_analysis"
    }

    async fn run(&self, mut state: SupervisorState) -> Result<(SupervisorState, Next), NodeError> {
        let mut candidates: HashMap<String, (String, u32)> = HashMap::new();
        for message in &state.conversation_history {
            if message.processed {
                continue;
            }
            if should_skip_user(&self.all_personas, &message.sender_username, &message.sender_first_name, &message.sender_last_name) {
                continue;
            }
            let entry = candidates.entry(message.sender_id.clone()).or_insert_with(|| (message.sender_username.clone(), 0));
            entry.1 += 1;
        }

        for (user_id, (user_name, new_message_count)) in candidates {
            let previous = self.memory.load_participant(&self.chat_id, &user_id).await.ok().flatten();
            let previous_snapshot = previous.as_ref().and_then(|p| p.latest_snapshot());
            let previous_count = previous_snapshot.map(|s| s.messages_analyzed_count).unwrap_or(0);
            let cumulative_count = previous_count + new_message_count;

            let user_messages = state
                .conversation_history
                .iter()
                .filter(|m| m.sender_id == user_id)
                .map(|m| m.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");

            let result = analyze_user_personality(
                self.llm.as_ref(),
                &user_name,
                &user_messages,
                cumulative_count,
                previous_snapshot,
                &self.settings,
                &self.model.model,
                self.model.temperature,
            )
            .await;

            let Some(big5) = result else {
                continue;
            };

            attach_personality_to_messages(&mut state.conversation_history, &user_id, &big5);

            if cumulative_count < self.settings.min_messages_for_analysis {
                continue;
            }

            let overall_confidence = if big5.is_empty() { 0.0 } else { big5.values().map(|s| s.confidence).sum::<f64>() / big5.len() as f64 };
            let mut record = previous.unwrap_or(crate::memory::ParticipantRecord {
                user_id: user_id.clone(),
                username: user_name.clone(),
                personality_snapshots: Vec::new(),
            });
            record.push_snapshot(PersonalitySnapshot {
                analysis_date: chrono::Utc::now().to_rfc3339(),
                messages_analyzed_count: cumulative_count,
                big5,
                overall_confidence,
            });
            if let Err(e) = self.memory.save_participant(&self.chat_id, &record).await {
                tracing::warn!(user_id = %user_id, error = %e, "failed to save personality snapshot");
            }
        }

        Ok((state, Next::Continue))
    }
}

// ---------------------------------------------------------------------------
// persona_fanout
// ---------------------------------------------------------------------------

/// Runs every persona's agent subgraph concurrently against the tick's target
/// message, then folds each outcome into `selected_actions`/`agents_recent_actions`
/// with the two append-only reducers — the single-node substitute for a native
/// fan-out/join primitive the graph engine doesn't have (see `agent_graph`).
struct PersonaFanout {
    personas: Vec<PersonaRuntime>,
}

#[async_trait]
impl Node<SupervisorState> for PersonaFanout {
    fn id(&self) -> &str {
        "persona_fanout"
    }

    async fn run(&self, mut state: SupervisorState) -> Result<(SupervisorState, Next), NodeError> {
        let Some(target_message) = state.conversation_history.last().cloned() else {
            return Ok((state, Next::Continue));
        };

        let runs = self.personas.iter().map(|runtime| {
            let agent_state = AgentState::new(
                runtime.persona.clone(),
                runtime.triggers.clone(),
                runtime.actions.clone(),
                state.conversation_history.clone(),
                target_message.clone(),
            );
            async move {
                let result = runtime.subgraph.invoke(agent_state, None).await;
                (runtime.persona.agent_name.clone(), runtime.persona.agent_type.clone(), result)
            }
        });

        let results = join_all(runs).await;

        let mut new_actions: Vec<(String, SelectedAction)> = Vec::new();
        let mut new_records: HashMap<String, Vec<ActionRecord>> = HashMap::new();

        for (agent_name, agent_type, result) in results {
            let final_state = match result {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(agent = %agent_name, error = %e, "agent subgraph run failed");
                    continue;
                }
            };
            let Some(action) = final_state.selected_action else {
                continue;
            };

            if let Some(record) = action_record(&agent_name, &agent_type, &action) {
                new_records.entry(agent_name.clone()).or_default().push(record);
            }
            new_actions.push((agent_name, action));
        }

        state.selected_actions.extend(new_actions);
        merge_agent_actions(&mut state.agents_recent_actions, &new_records);

        Ok((state, Next::Continue))
    }
}

/// Builds an `ActionRecord` for outcomes that produced a dispatchable message
/// (`Success`/`MaxRetriesReached`); `no_action_needed`/`error` leave no record.
fn action_record(agent_name: &str, agent_type: &str, action: &SelectedAction) -> Option<ActionRecord> {
    match action {
        SelectedAction::Success {
            action_id,
            purpose,
            styled_response,
            trigger_id,
            trigger_justification,
            target_message,
            ..
        }
        | SelectedAction::MaxRetriesReached {
            action_id,
            purpose,
            styled_response,
            trigger_id,
            trigger_justification,
            target_message,
            ..
        } => Some(ActionRecord {
            agent_name: agent_name.to_string(),
            agent_type: agent_type.to_string(),
            action_id: action_id.clone(),
            purpose: purpose.clone(),
            styled_response: styled_response.clone(),
            trigger_id: trigger_id.clone(),
            trigger_justification: trigger_justification.clone(),
            target_message: TargetMessage {
                timestamp: target_message.timestamp.clone(),
                text: target_message.text.clone(),
            },
            timestamp: chrono::Utc::now().to_rfc3339(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActionDefinition, GroupMetadata, Message, TriggerDefinition};
    use crate::llm::MockLlmClient;
    use crate::memory::JsonMemoryStore;
    use crate::transport::{MockChatTransport, ParticipantsInfo};
    use flowgraph::memory::MemorySaver;

    fn message(id: &str, sender: &str, text: &str) -> Message {
        Message {
            message_id: id.into(),
            sender_id: sender.into(),
            sender_username: sender.into(),
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

    fn persona() -> Persona {
        Persona {
            agent_name: "Alex".into(),
            agent_type: "coach".into(),
            phone_number: "+1555".into(),
            user_name: "alex".into(),
            first_name: "Alex".into(),
            last_name: "".into(),
            agent_goal: "keep the group motivated".into(),
            persona_description: "upbeat".into(),
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

    fn model() -> ModelSettings {
        ModelSettings {
            model: "gpt-5-nano".into(),
            temperature: 0.0,
        }
    }

    fn persona_runtime(llm: Arc<dyn LlmClient>) -> PersonaRuntime {
        let models = agent_graph::AgentGraphModels {
            trigger_analysis: model(),
            decision_maker: model(),
            text_generator: model(),
            styler: model(),
            validator: model(),
        };
        PersonaRuntime {
            persona: persona(),
            triggers: triggers(),
            actions: actions(),
            subgraph: agent_graph::build(llm, &models).unwrap(),
        }
    }

    #[tokio::test]
    async fn fanout_is_a_no_op_with_empty_conversation() {
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlmClient::fixed("unused"));
        let node = PersonaFanout {
            personas: vec![persona_runtime(llm)],
        };
        let state = SupervisorState::new(GroupMetadata::default(), vec![]);
        let (out, _) = node.run(state).await.unwrap();
        assert!(out.selected_actions.is_empty());
    }

    #[tokio::test]
    async fn fanout_appends_success_action_and_record() {
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlmClient::scripted(vec![
            r#"{"trigger_id":"struggling","justification":"said it's hard"}"#.into(),
            r#"{"id":"nudge","purpose":"encourage them"}"#.into(),
            "You've got this.".into(),
            "Hey champ, you've got this!".into(),
            r#"{"approved":true,"reason":"on point"}"#.into(),
        ]));
        let node = PersonaFanout {
            personas: vec![persona_runtime(llm)],
        };
        let state = SupervisorState::new(GroupMetadata::default(), vec![message("1", "bob", "this is hard")]);
        let (out, _) = node.run(state).await.unwrap();
        assert_eq!(out.selected_actions.len(), 1);
        assert_eq!(out.selected_actions[0].0, "Alex");
        assert_eq!(out.agents_recent_actions.get("Alex").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fanout_neutral_trigger_appends_no_action_but_no_record() {
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlmClient::fixed(r#"{"trigger_id":"neutral","justification":"nothing notable"}"#));
        let node = PersonaFanout {
            personas: vec![persona_runtime(llm)],
        };
        let state = SupervisorState::new(GroupMetadata::default(), vec![message("1", "bob", "all good")]);
        let (out, _) = node.run(state).await.unwrap();
        assert_eq!(out.selected_actions.len(), 1);
        assert!(matches!(out.selected_actions[0].1, SelectedAction::NoActionNeeded { .. }));
        assert!(out.agents_recent_actions.is_empty());
    }

    #[tokio::test]
    async fn full_supervisor_graph_runs_to_executor_without_hitl() {
        // emotion_analysis and personality_analysis run ahead of the agent pipeline and
        // share this same mock client, so their calls (1 + 5 trait calls for "bob") are
        // scripted first, in the order the nodes actually run in.
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlmClient::scripted(vec![
            r#"{"message_emotions":[{"message_id":"1","emotion":"concerned","justification":"said it's hard"}],"group_sentiment":"supportive"}"#.into(),
            r#"{"score":50,"confidence":0.6,"justification":"ok"}"#.into(),
            r#"{"score":50,"confidence":0.6,"justification":"ok"}"#.into(),
            r#"{"score":50,"confidence":0.6,"justification":"ok"}"#.into(),
            r#"{"score":50,"confidence":0.6,"justification":"ok"}"#.into(),
            r#"{"score":50,"confidence":0.6,"justification":"ok"}"#.into(),
            r#"{"trigger_id":"struggling","justification":"said it's hard"}"#.into(),
            r#"{"id":"nudge","purpose":"encourage them"}"#.into(),
            "You've got this.".into(),
            "Hey champ, you've got this!".into(),
            r#"{"approved":true,"reason":"on point"}"#.into(),
        ]));
        let transport: Arc<dyn ChatTransport> = Arc::new(MockChatTransport::new(
            vec![],
            ParticipantsInfo {
                chat_title: "g".into(),
                chat_description: "".into(),
                participants_count: 2,
            },
        ));
        let tmp = tempfile::tempdir().unwrap();
        let memory: Arc<dyn MemoryStore> = Arc::new(JsonMemoryStore::new(tmp.path(), tmp.path()));
        let ipc = crate::memory::ApprovalIpc::new(tmp.path());

        let settings_toml = r#"
chat_id = "chat-1"
transport_base_url = "http://localhost:9"

[[agents]]
agent_name = "Alex"
agent_type = "coach"
phone_number = "+1555"
triggers_path = "t.json"
actions_path = "a.json"

[polling]
message_check_interval_seconds = 30
telegram_fetch_limit = 100
"#;
        let settings_path = tmp.path().join("supervisor.toml");
        std::fs::write(&settings_path, settings_toml).unwrap();
        let settings = Settings::load(&settings_path).unwrap();

        let personas = vec![persona_runtime(llm.clone())];
        let checkpointer: Arc<dyn Checkpointer<SupervisorState>> = Arc::new(MemorySaver::new());

        let graph = build(llm, transport, memory, ipc, &settings, personas, checkpointer).unwrap();
        let state = SupervisorState::new(GroupMetadata::default(), vec![message("1", "bob", "this is hard")]);
        let result = graph.invoke(state, None).await.unwrap();
        assert!(result.execution_queue.is_empty());
    }
}
