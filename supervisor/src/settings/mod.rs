//! Loads `supervisor.toml` (agents, polling, HITL, per-node model config) and the
//! persona trigger/action catalog files it references.
//!
//! Secrets and deployment-environment overrides (`OPENAI_API_KEY`, `LOG_FILE`,
//! transport base URL) are layered on top via the workspace `config` crate, exactly
//! as `config::load_and_apply` already does for its own `[env]` table.

mod catalog;
mod model;

pub use catalog::{load_action_catalog, load_persona, load_trigger_catalog};
pub use model::{ModelSettings, NodeModelConfig};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::Persona;
use crate::errors::SupervisorError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSettings {
    pub message_check_interval_seconds: u64,
    pub telegram_fetch_limit: u32,
    #[serde(default = "default_max_recent_messages")]
    pub max_recent_messages: usize,
    #[serde(default = "default_max_initial_actions_per_agent")]
    pub max_initial_actions_per_agent: usize,
}

fn default_max_recent_messages() -> usize {
    50
}

fn default_max_initial_actions_per_agent() -> usize {
    5
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HitlSettings {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCountConfidencePenalty {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_min_messages_full_confidence")]
    pub min_messages_full_confidence: u32,
    #[serde(default = "default_penalty_factor")]
    pub penalty_factor: f64,
}

fn default_min_messages_full_confidence() -> u32 {
    10
}

fn default_penalty_factor() -> f64 {
    0.1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalityAnalysisSettings {
    #[serde(default = "default_min_messages_for_analysis")]
    pub min_messages_for_analysis: u32,
    #[serde(default)]
    pub confidence_thresholds: std::collections::HashMap<String, f64>,
    #[serde(default)]
    pub message_count_confidence_penalty: MessageCountConfidencePenalty,
    #[serde(default = "default_true")]
    pub stop_reanalysis_when_confident: bool,
}

fn default_min_messages_for_analysis() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub agent_name: String,
    pub agent_type: String,
    pub phone_number: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub agent_goal: String,
    #[serde(default)]
    pub persona_description: String,
    pub triggers_path: String,
    pub actions_path: String,
}

impl From<AgentConfig> for Persona {
    fn from(a: AgentConfig) -> Self {
        Persona {
            agent_name: a.agent_name,
            agent_type: a.agent_type,
            phone_number: a.phone_number,
            user_name: a.user_name,
            first_name: a.first_name,
            last_name: a.last_name,
            agent_goal: a.agent_goal,
            persona_description: a.persona_description,
            triggers_path: a.triggers_path,
            actions_path: a.actions_path,
        }
    }
}

/// Top-level `supervisor.toml` shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub chat_id: String,
    pub agents: Vec<AgentConfig>,
    pub polling: PollingSettings,
    #[serde(default)]
    pub hitl: HitlSettings,
    #[serde(default)]
    pub personality_analysis: PersonalityAnalysisSettings,
    #[serde(default)]
    pub models: std::collections::HashMap<String, NodeModelConfig>,
    #[serde(default = "default_transport_base_url")]
    pub transport_base_url: String,
}

fn default_transport_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for PersonalityAnalysisSettings {
    fn default() -> Self {
        Self {
            min_messages_for_analysis: default_min_messages_for_analysis(),
            confidence_thresholds: Default::default(),
            message_count_confidence_penalty: MessageCountConfidencePenalty {
                enabled: false,
                min_messages_full_confidence: default_min_messages_full_confidence(),
                penalty_factor: default_penalty_factor(),
            },
            stop_reanalysis_when_confident: true,
        }
    }
}

impl Default for HitlSettings {
    fn default() -> Self {
        Self { enabled: false }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SupervisorError> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| SupervisorError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn personas(&self) -> Vec<Persona> {
        self.agents.iter().cloned().map(Persona::from).collect()
    }

    /// Model config for a node, applying the env-var override (e.g. `VALIDATOR_MODEL`)
    /// before falling back to `supervisor.toml`'s `[models.<node>]` then hard defaults.
    pub fn model_for_node(&self, node: &str) -> ModelSettings {
        model::get_model_settings(node, self.models.get(node))
    }
}
