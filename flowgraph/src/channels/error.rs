//! Channel-related errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("invalid update: {0}")]
    InvalidUpdate(String),
}
