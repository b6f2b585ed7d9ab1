//! Chat-completion backend via async_openai
//!
//! Generic over the endpoint flavour: `OpenAIConfig` covers OpenAI and any
//! compatible proxy (configurable base_url), `AzureConfig` covers Azure
//! OpenAI deployments. Generation parameters come from `[llm]` config.

use async_openai::config::{AzureConfig, Config, OpenAIConfig};
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::config::LlmSection;
use crate::llm::{BackendError, LlmBackend};
use crate::session::{Message, Role};

/// Chat-completion client; converts session entries to API messages and
/// extracts the first choice's content
pub struct ChatCompletionBackend<C: Config> {
    client: Client<C>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionBackend<OpenAIConfig> {
    /// OpenAI-compatible endpoint; api key falls back to `OPENAI_API_KEY`
    pub fn openai(llm: &LlmSection) -> Self {
        let api_key = llm
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = match llm.base_url.as_deref() {
            Some(url) => OpenAIConfig::new().with_api_base(url).with_api_key(api_key),
            None => OpenAIConfig::new().with_api_key(api_key),
        };
        Self::with_config(config, llm)
    }
}

impl ChatCompletionBackend<AzureConfig> {
    /// Azure OpenAI deployment; the deployment id defaults to the model name
    /// and the api key falls back to `AZURE_OPENAI_API_KEY`
    pub fn azure(llm: &LlmSection) -> Self {
        let api_key = llm
            .api_key
            .clone()
            .or_else(|| std::env::var("AZURE_OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "azure-key-placeholder".to_string());

        let mut config = AzureConfig::new().with_api_key(api_key);
        if let Some(endpoint) = llm.azure.endpoint.as_deref() {
            config = config.with_api_base(endpoint);
        }
        let deployment = llm.azure.deployment.as_deref().unwrap_or(&llm.model);
        config = config.with_deployment_id(deployment);
        if let Some(version) = llm.azure.api_version.as_deref() {
            config = config.with_api_version(version);
        }
        Self::with_config(config, llm)
    }
}

impl<C: Config> ChatCompletionBackend<C> {
    pub fn with_config(config: C, llm: &LlmSection) -> Self {
        Self {
            client: Client::with_config(config),
            model: llm.model.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
        }
    }

    fn request_messages(&self, messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m.role {
                Role::System => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .unwrap(),
                ),
                Role::User => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .unwrap(),
                ),
                Role::Assistant => ChatCompletionRequestMessage::Assistant(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .unwrap(),
                ),
            })
            .collect()
    }
}

#[async_trait]
impl<C: Config> LlmBackend for ChatCompletionBackend<C> {
    async fn complete(&self, messages: &[Message]) -> Result<String, BackendError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.request_messages(messages))
            .temperature(self.temperature)
            .max_completion_tokens(self.max_tokens)
            .build()
            .map_err(|e| BackendError::Completion(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| BackendError::Completion(e.to_string()))?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion usage"
            );
        }

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or(BackendError::EmptyCompletion)
    }
}
