//! Per-node model config: `supervisor.toml` defaults, overridden by a node-specific
//! env var, matching `config::load_and_apply`'s existing-env-wins layering.

use serde::{Deserialize, Serialize};

const DEFAULT_MODEL: &str = "gpt-5-nano";
const DEFAULT_TEMPERATURE: f32 = 0.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeModelConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
}

/// Maps a node name (`"validator"`, `"trigger_analysis"`, ...) to its override env
/// var name (`VALIDATOR_MODEL`, `TRIGGER_ANALYSIS_MODEL`, ...).
fn env_var_name(node: &str) -> String {
    format!("{}_MODEL", node.to_uppercase())
}

/// Resolves model settings with precedence: env var > `supervisor.toml` entry > defaults.
pub fn get_model_settings(node: &str, config_entry: Option<&NodeModelConfig>) -> ModelSettings {
    let env_override = std::env::var(env_var_name(node)).ok();

    let model = env_override
        .or_else(|| config_entry.and_then(|c| c.model.clone()))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let temperature = config_entry.and_then(|c| c.temperature).unwrap_or(DEFAULT_TEMPERATURE);

    ModelSettings { model, temperature }
}
