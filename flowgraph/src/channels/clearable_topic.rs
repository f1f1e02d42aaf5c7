//! ClearableTopic channel: accumulates values into a list, with an explicit CLEAR
//! sentinel that resets the list to empty.
//!
//! Used for fields that several fan-out branches append to concurrently within a
//! tick (e.g. one entry per persona), and that a later node in the same tick needs
//! to reset to empty once it has consumed them — an accumulate/ephemeral flag alone
//! can't express "append all tick, then clear" because the clear has to happen from
//! a *different* node than the appenders.

use super::{Channel, ChannelError};
use std::fmt::Debug;

/// An update applied to a `ClearableTopic`: either append values, or reset to empty.
#[derive(Debug, Clone)]
pub enum Delta<T> {
    Append(Vec<T>),
    Clear,
}

/// List channel with append semantics and an explicit clear sentinel.
#[derive(Debug, Clone, Default)]
pub struct ClearableTopic<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    values: Vec<T>,
}

impl<T> ClearableTopic<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Applies a sequence of deltas in order; a `Clear` resets before later appends.
    pub fn apply(&mut self, deltas: Vec<Delta<T>>) {
        for delta in deltas {
            match delta {
                Delta::Append(items) => self.values.extend(items),
                Delta::Clear => self.values.clear(),
            }
        }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }
}

impl<T> Channel<Delta<T>> for ClearableTopic<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn read(&self) -> Option<Delta<T>> {
        if self.values.is_empty() {
            None
        } else {
            Some(Delta::Append(self.values.clone()))
        }
    }

    fn write(&mut self, value: Delta<T>) {
        self.apply(vec![value]);
    }

    fn update(&mut self, updates: Vec<Delta<T>>) -> Result<(), ChannelError> {
        self.apply(updates);
        Ok(())
    }

    fn channel_type(&self) -> &'static str {
        "ClearableTopic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_accumulate_across_updates() {
        let mut topic: ClearableTopic<i32> = ClearableTopic::new();
        topic.apply(vec![Delta::Append(vec![1, 2])]);
        topic.apply(vec![Delta::Append(vec![3])]);
        assert_eq!(topic.values(), &[1, 2, 3]);
    }

    #[test]
    fn clear_resets_to_empty() {
        let mut topic: ClearableTopic<i32> = ClearableTopic::new();
        topic.apply(vec![Delta::Append(vec![1, 2])]);
        topic.apply(vec![Delta::Clear]);
        assert!(topic.is_empty());
    }

    #[test]
    fn clear_then_append_in_same_batch() {
        let mut topic: ClearableTopic<i32> = ClearableTopic::new();
        topic.apply(vec![Delta::Append(vec![1])]);
        topic.apply(vec![Delta::Clear, Delta::Append(vec![2])]);
        assert_eq!(topic.values(), &[2]);
    }
}
