//! LLM adapter: one capability, `complete`, called from every prompt-driven node.

mod mock;
mod openai;

pub use mock::MockLlmClient;
pub use openai::OpenAiLlmClient;

use async_trait::async_trait;

use crate::errors::LlmError;

/// A single chat-completion call: system + user prompt, model, sampling temperature.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str, model: &str, temperature: f32) -> Result<String, LlmError>;
}
