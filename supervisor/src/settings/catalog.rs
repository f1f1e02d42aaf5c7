//! Loads the trigger/action catalog JSON files a persona's `supervisor.toml` entry
//! points at, plus an optional on-disk persona description override.

use std::path::Path;

use crate::domain::{ActionCatalog, Persona, TriggerCatalog};
use crate::errors::SupervisorError;

pub fn load_trigger_catalog(path: &Path) -> Result<TriggerCatalog, SupervisorError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| SupervisorError::Config(format!("parsing trigger catalog {}: {e}", path.display())))
}

pub fn load_action_catalog(path: &Path) -> Result<ActionCatalog, SupervisorError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| SupervisorError::Config(format!("parsing action catalog {}: {e}", path.display())))
}

/// A persona is already fully described by its `supervisor.toml` `[[agents]]` entry;
/// this just validates its catalogs resolve to readable files under `base_dir`.
pub fn load_persona(persona: &Persona, base_dir: &Path) -> Result<(TriggerCatalog, ActionCatalog), SupervisorError> {
    let triggers = load_trigger_catalog(&base_dir.join(&persona.triggers_path))?;
    let actions = load_action_catalog(&base_dir.join(&persona.actions_path))?;
    Ok((triggers, actions))
}
