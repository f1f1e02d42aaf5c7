//! `LlmClient` over `async-openai`'s Chat Completions API.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, trace};

use crate::errors::LlmError;

use super::LlmClient;

/// Thin wrapper around an `async-openai` client. `model`/`temperature` are passed
/// per-call (each node picks its own per `supervisor::settings`), so this type
/// holds only the HTTP client itself.
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
}

impl OpenAiLlmClient {
    /// Builds a client reading `OPENAI_API_KEY` (and optional `OPENAI_BASE_URL`) from
    /// the environment, as primed by `supervisor::settings`/`config::load_and_apply`.
    pub fn new() -> Self {
        Self { client: Client::new() }
    }

    pub fn with_config(config: OpenAIConfig) -> Self {
        Self {
            client: Client::with_config(config),
        }
    }
}

impl Default for OpenAiLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for OpenAiLlmClient {
    async fn complete(&self, system: &str, user: &str, model: &str, temperature: f32) -> Result<String, LlmError> {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(system)),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(user)),
        ];

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(model);
        args.messages(messages);
        args.temperature(temperature);

        let request = args
            .build()
            .map_err(|e| LlmError::Request(format!("request build failed: {e}")))?;

        debug!(model = %model, temperature = %temperature, "llm chat create");
        if let Ok(js) = serde_json::to_string(&request) {
            trace!(request = %js, "llm request body");
        }

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Request("no choices returned".to_string()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}
