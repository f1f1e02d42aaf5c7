//! LastValue channel: keeps only the most recently written value.

use super::{Channel, ChannelError};
use std::fmt::Debug;

/// Keeps only the last value written; each `update` overwrites the previous one.
#[derive(Debug, Clone, Default)]
pub struct LastValue<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    value: Option<T>,
}

impl<T> LastValue<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    pub fn new() -> Self {
        Self { value: None }
    }
}

impl<T> Channel<T> for LastValue<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn read(&self) -> Option<T> {
        self.value.clone()
    }

    fn write(&mut self, value: T) {
        self.value = Some(value);
    }

    fn update(&mut self, updates: Vec<T>) -> Result<(), ChannelError> {
        if let Some(last) = updates.into_iter().last() {
            self.value = Some(last);
        }
        Ok(())
    }

    fn channel_type(&self) -> &'static str {
        "LastValue"
    }
}
