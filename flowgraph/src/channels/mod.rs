//! Channels for state management with different update strategies.
//!
//! - `LastValue`: keeps only the last written value.
//! - `ClearableTopic`: accumulates into a list, with a `Delta::Clear` sentinel.
//! - `StateUpdater`/`ReplaceUpdater`/`FieldBasedUpdater`: how a `StateGraph` merges
//!   a node's returned state into the running state.

mod clearable_topic;
mod error;
mod last_value;
mod updater;

pub use clearable_topic::{ClearableTopic, Delta};
pub use error::ChannelError;
pub use last_value::LastValue;
pub use updater::{BoxedStateUpdater, FieldBasedUpdater, ReplaceUpdater, StateUpdater};

use std::fmt::Debug;

/// A channel manages how concurrent writers' values are combined into one.
pub trait Channel<T>: Send + Sync + Debug
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn read(&self) -> Option<T>;
    fn write(&mut self, value: T);
    fn update(&mut self, updates: Vec<T>) -> Result<(), ChannelError>;
    fn channel_type(&self) -> &'static str;
}
