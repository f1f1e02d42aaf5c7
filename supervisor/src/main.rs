//! Run loop (C9): cold-start bootstrap, then poll-analyze-act forever.
//!
//! A single `thread_id` identifies one tick's graph run to the checkpointer. When
//! the human-approval gate interrupts, this loop is the one that waits for the
//! operator's response and calls `resume` — the gate node itself never blocks.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use flowgraph::graph::CompiledStateGraph;
use flowgraph::memory::{Checkpointer, JsonFileSaver, RunnableConfig};
use flowgraph::NodeError;

use supervisor::agent_graph::{self, AgentGraphModels};
use supervisor::domain::{Message, SupervisorState};
use supervisor::errors::SupervisorError;
use supervisor::human_approval::{apply_operator_response, decision_log_entries};
use supervisor::identity::is_agent_message;
use supervisor::llm::{LlmClient, OpenAiLlmClient};
use supervisor::memory::{ApprovalIpc, ApprovalRequestPayload, ApprovalResponsePayload, JsonMemoryStore, MemoryStore};
use supervisor::poller::{self, SeenIdsRing};
use supervisor::settings::{self, Settings};
use supervisor::supervisor_graph::{self, PersonaRuntime};
use supervisor::transport::{ChatTransport, HttpChatTransport};
use supervisor::{domain, logging};

/// Interval between checks of `response.json` while a human-approval interrupt is open.
const APPROVAL_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// How many idle ticks pass between "still idle" log lines, so the log doesn't spam.
const IDLE_LOG_EVERY: u32 = 20;

#[derive(Parser, Debug)]
#[command(name = "supervisor", about = "Multi-persona conversational agent supervisor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the configured chat and drive the agent pipeline.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Path to the supervisor.toml config file.
    #[arg(long, default_value = "supervisor.toml")]
    config: PathBuf,

    /// Base directory persona trigger/action catalog paths are resolved against.
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Directory for persisted group/participant/action JSON records.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Directory for operator-decision logs and the rotating run log.
    #[arg(long, default_value = "logs")]
    logs_dir: PathBuf,

    /// Directory for graph checkpoints and the approval-gate IPC files.
    #[arg(long, default_value = "state")]
    state_dir: PathBuf,

    /// Run a single cold-start-and-tick cycle, then exit, instead of polling forever.
    /// Intended for integration tests and manual one-off runs.
    #[arg(long)]
    one_shot: bool,

    /// Increase log verbosity (`-v` debug, `-vv` trace). Ignored if `RUST_LOG` is set.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Cli { command: Command::Run(args) } = Cli::parse();

    config::load_and_apply("supervisor", None)?;
    apply_verbosity(args.verbose);
    let _log_guard = logging::init(&args.logs_dir)?;

    tracing::info!("supervisor starting up");
    match run(args).await {
        Ok(()) => {
            tracing::info!("supervisor shut down cleanly");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "supervisor exited with error");
            Err(e.into())
        }
    }
}

/// Maps `-v`/`-vv` onto `RUST_LOG`, without overriding an operator-set value —
/// same existing-env-wins precedence `config::load_and_apply` uses.
fn apply_verbosity(verbose: u8) {
    if std::env::var("RUST_LOG").is_ok() {
        return;
    }
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    std::env::set_var("RUST_LOG", level);
}

async fn run(args: RunArgs) -> Result<(), SupervisorError> {
    let settings = Settings::load(&args.config)?;

    let llm: Arc<dyn LlmClient> = Arc::new(OpenAiLlmClient::new());
    let transport: Arc<dyn ChatTransport> = Arc::new(HttpChatTransport::new(settings.transport_base_url.clone()));
    let memory: Arc<dyn MemoryStore> = Arc::new(JsonMemoryStore::new(args.data_dir.clone(), args.logs_dir.clone()));
    let ipc = ApprovalIpc::new(&args.state_dir);
    let checkpointer: Arc<dyn Checkpointer<SupervisorState>> = Arc::new(JsonFileSaver::new(args.state_dir.join("checkpoints")));

    let personas = settings.personas();
    let models = AgentGraphModels {
        trigger_analysis: settings.model_for_node("trigger_analysis"),
        decision_maker: settings.model_for_node("decision_maker"),
        text_generator: settings.model_for_node("text_generator"),
        styler: settings.model_for_node("styler"),
        validator: settings.model_for_node("validator"),
    };

    let mut persona_runtimes = Vec::with_capacity(personas.len());
    for persona in &personas {
        let (triggers, actions) = settings::load_persona(persona, &args.base_dir)?;
        let subgraph = agent_graph::build(llm.clone(), &models)?;
        persona_runtimes.push(PersonaRuntime {
            persona: persona.clone(),
            triggers,
            actions,
            subgraph,
        });
    }

    let graph = supervisor_graph::build(
        llm,
        transport.clone(),
        memory.clone(),
        ApprovalIpc::new(&args.state_dir),
        &settings,
        persona_runtimes,
        checkpointer,
    )?;

    let chat_id = settings.chat_id.clone();
    let primary_phone = personas
        .first()
        .map(|p| p.phone_number.clone())
        .ok_or_else(|| SupervisorError::Config("supervisor.toml must configure at least one agent".into()))?;

    let mut ring = SeenIdsRing::new();
    let mut state = cold_start(&*transport, &*memory, &personas, &chat_id, &primary_phone, &settings, &mut ring).await?;

    if state.conversation_history.iter().any(|m| !m.processed) {
        state = tick(&graph, &ipc, &*memory, state, &chat_id).await?;
        memory.save_group_history(&chat_id, &state.conversation_history).await?;
    }

    if args.one_shot {
        tracing::info!("one-shot run complete");
        return Ok(());
    }

    let mut idle_ticks = 0u32;
    loop {
        tokio::time::sleep(Duration::from_secs(settings.polling.message_check_interval_seconds)).await;

        let new_messages = poller::poll(&*transport, &primary_phone, &chat_id, settings.polling.telegram_fetch_limit, &mut ring, &personas).await?;

        if new_messages.is_empty() {
            idle_ticks += 1;
            if idle_ticks % IDLE_LOG_EVERY == 0 {
                tracing::info!(ticks = idle_ticks, "idle, no new messages");
            }
            continue;
        }
        idle_ticks = 0;

        state.conversation_history.extend(new_messages);
        state.conversation_history.sort_by_key(|m| m.date);
        domain::trim_recent_messages(&mut state.conversation_history, settings.polling.max_recent_messages);

        state = tick(&graph, &ipc, &*memory, state, &chat_id).await?;
        memory.save_group_history(&chat_id, &state.conversation_history).await?;
    }
}

/// Fetches group metadata and initial history, reconciling it with whatever the
/// previous run persisted (so already-analyzed emotion/personality annotations
/// survive a restart), and primes the dedup ring from the result.
async fn cold_start(
    transport: &dyn ChatTransport,
    memory: &dyn MemoryStore,
    personas: &[domain::Persona],
    chat_id: &str,
    primary_phone: &str,
    settings: &Settings,
    ring: &mut SeenIdsRing,
) -> Result<SupervisorState, SupervisorError> {
    let participants = transport.fetch_participants(primary_phone, chat_id).await?;
    let group = domain::GroupMetadata {
        group_id: chat_id.to_string(),
        group_name: participants.chat_title,
        topic: participants.chat_description,
        member_count: participants.participants_count,
    };

    let fetched = transport.fetch_messages(primary_phone, chat_id, settings.polling.telegram_fetch_limit).await?;
    let persisted = memory.load_group_history(chat_id).await?;

    let mut merged = merge_message_history(persisted, fetched);
    domain::trim_recent_messages(&mut merged, settings.polling.max_recent_messages);

    memory.save_group_history(chat_id, &merged).await?;

    ring.prime(merged.iter().map(|m| m.message_id.clone()));
    for message in merged.iter_mut() {
        if is_agent_message(personas, message) {
            message.processed = true;
        }
    }

    let mut state = SupervisorState::new(group, merged);
    for persona in personas {
        let history = memory.load_agent_actions(chat_id, &persona.agent_name).await?;
        let recent = history.into_iter().rev().take(settings.polling.max_initial_actions_per_agent).rev().collect();
        state.agents_recent_actions.insert(persona.agent_name.clone(), recent);
    }

    tracing::info!(chat_id, messages = state.conversation_history.len(), "cold start complete");
    Ok(state)
}

/// Runs one tick of the supervisor graph, transparently riding out a human-approval
/// interrupt: poll `response.json` every [`APPROVAL_POLL_INTERVAL`] until the
/// operator answers, fold the response into state, then resume.
async fn tick(
    graph: &CompiledStateGraph<SupervisorState>,
    ipc: &ApprovalIpc,
    memory: &dyn MemoryStore,
    state: SupervisorState,
    chat_id: &str,
) -> Result<SupervisorState, SupervisorError> {
    let config = RunnableConfig {
        thread_id: Some(format!("{chat_id}-{}", uuid::Uuid::new_v4())),
        ..Default::default()
    };

    match graph.invoke(state, Some(config.clone())).await {
        Ok(final_state) => Ok(final_state),
        Err(NodeError::Interrupted(interrupt)) => {
            tracing::info!(thread_id = ?config.thread_id, "awaiting operator approval");
            let response = wait_for_operator_response(ipc).await?;
            record_operator_decisions(memory, chat_id, &interrupt.0.value, &response).await?;
            let resumed = graph.resume(config, |s| apply_operator_response(s, &response)).await?;
            ipc.clear().await?;
            Ok(resumed)
        }
        Err(e) => Err(e.into()),
    }
}

/// Persists the operator's approved/rejected decisions to `decisions.json`, per
/// §6's `logs/operator_decisions/<group_id>/` layout. `request_value` is the
/// interrupt payload raised by the gate node, carrying the queue as it stood when
/// the approval request was published.
async fn record_operator_decisions(
    memory: &dyn MemoryStore,
    chat_id: &str,
    request_value: &serde_json::Value,
    response: &ApprovalResponsePayload,
) -> Result<(), SupervisorError> {
    let request: ApprovalRequestPayload = serde_json::from_value(request_value.clone())
        .map_err(|e| SupervisorError::Config(format!("malformed approval interrupt payload: {e}")))?;

    let (approved, rejected) = decision_log_entries(&request.data.pending_messages, response);
    if approved.is_empty() && rejected.is_empty() {
        return Ok(());
    }

    let mut log = memory.load_decision_log(chat_id).await?;
    log.approved.extend(approved);
    log.rejected.extend(rejected);
    memory.save_decision_log(chat_id, &log).await?;
    Ok(())
}

async fn wait_for_operator_response(ipc: &ApprovalIpc) -> Result<ApprovalResponsePayload, SupervisorError> {
    loop {
        if let Some(response) = ipc.poll_response().await? {
            return Ok(response);
        }
        tokio::time::sleep(APPROVAL_POLL_INTERVAL).await;
    }
}

/// Reconciles freshly fetched messages with whatever was already persisted:
/// a persisted copy wins on id collision (it may carry emotion/personality
/// annotations a bare transport fetch never would), then the union is
/// resorted by `date` since the transport's own fetch order is unspecified.
fn merge_message_history(persisted: Vec<Message>, fetched: Vec<Message>) -> Vec<Message> {
    let mut by_id: std::collections::HashMap<String, Message> = persisted.into_iter().map(|m| (m.message_id.clone(), m)).collect();
    for message in fetched {
        by_id.entry(message.message_id.clone()).or_insert(message);
    }
    let mut merged: Vec<Message> = by_id.into_values().collect();
    merged.sort_by_key(|m| m.date);
    merged
}
