//! Persona definitions: the roster of agents the supervisor can act as.

use serde::{Deserialize, Serialize};

/// One agent persona, loaded from `supervisor.toml`'s `[[agents]]` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
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
