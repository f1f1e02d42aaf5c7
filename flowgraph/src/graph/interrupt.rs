//! Interrupt mechanism for graph execution.
//!
//! Supports suspending graph execution for human-in-the-loop scenarios: a node
//! raises an interrupt, the compiled graph saves a checkpoint and returns control
//! to the caller, and execution later continues via `CompiledStateGraph::resume`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::NodeError;

/// Interrupt value raised during graph execution.
///
/// Carries whatever payload the suspending node wants the caller to see (e.g. an
/// approval request) as JSON, so it can cross the process boundary unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interrupt {
    /// The interrupt payload.
    pub value: serde_json::Value,
    /// Optional interrupt id, for correlating with a later resume.
    pub id: Option<String>,
}

impl Interrupt {
    /// Creates a new interrupt with a value.
    pub fn new(value: serde_json::Value) -> Self {
        Self { value, id: None }
    }

    /// Creates a new interrupt with a value and id.
    pub fn with_id(value: serde_json::Value, id: String) -> Self {
        Self {
            value,
            id: Some(id),
        }
    }
}

/// Error raised when a graph is interrupted. Caught by `CompiledStateGraph::invoke`.
#[derive(Debug, Clone, Error)]
#[error("graph interrupted: {0:?}")]
pub struct GraphInterrupt(pub Interrupt);

impl From<Interrupt> for GraphInterrupt {
    fn from(interrupt: Interrupt) -> Self {
        GraphInterrupt(interrupt)
    }
}

/// Trait for observing interrupts as they happen (logging, metrics); does not
/// resolve them. Resolution always happens out-of-band via `resume`.
pub trait InterruptHandler: Send + Sync {
    /// Called when an interrupt is raised, before the checkpoint is saved.
    fn on_interrupt(&self, interrupt: &Interrupt) -> Result<(), NodeError>;
}

/// Default interrupt handler: no-op.
#[derive(Debug, Clone, Default)]
pub struct DefaultInterruptHandler;

impl InterruptHandler for DefaultInterruptHandler {
    fn on_interrupt(&self, _interrupt: &Interrupt) -> Result<(), NodeError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_new_has_no_id() {
        let i = Interrupt::new(serde_json::json!({"a": 1}));
        assert!(i.id.is_none());
    }

    #[test]
    fn default_handler_is_noop() {
        let handler = DefaultInterruptHandler;
        let i = Interrupt::new(serde_json::json!(null));
        assert!(handler.on_interrupt(&i).is_ok());
    }
}
