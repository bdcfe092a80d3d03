use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rchain::ai::{AIMessage, Usage};
use crate::rchain::chat_models::UsagePayload;
use crate::rchain::chat_runtime::{endpoint_url, post_json};
use crate::rchain::provider::{ChatMessage, ClientConfig, ProviderError, ProviderKind};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-3.5-turbo-instruct";
pub const OPENAI_DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: Option<String>,
}

/// Client for the OpenAI text-completions endpoint. The prompt messages are
/// flattened into one transcript before sending.
#[derive(Debug, Clone)]
pub struct OpenAiCompletions {
    config: ClientConfig,
    client: Client,
}

impl OpenAiCompletions {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        ProviderKind::Openai
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn invoke(&self, messages: &[ChatMessage]) -> Result<AIMessage, ProviderError> {
        let provider = self.kind();
        let api_key = match (provider.api_key_env(), self.config.api_key.as_deref()) {
            (Some(key_env), None) => {
                return Err(ProviderError::MissingApiKey { provider, key_env });
            }
            (_, key) => key,
        };

        let payload = CompletionRequest {
            model: &self.config.model,
            prompt: to_transcript(messages),
            temperature: self.config.temperature,
        };
        let url = endpoint_url(&self.config.base_url, "completions");
        debug!(%provider, model = %self.config.model, "dispatching text completion");

        let body: CompletionResponse = post_json(
            &self.client,
            &url,
            api_key,
            &payload,
            self.config.timeout_secs,
        )
        .await
        .map_err(|failure| failure.into_provider_error(provider))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.text)
            .ok_or(ProviderError::EmptyResponse { provider })?;

        Ok(AIMessage {
            content,
            usage: body.usage.map(Usage::from),
        })
    }
}

/// Renders messages as `Role: content` lines.
pub fn to_transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|message| format!("{}: {}", message.role.transcript_prefix(), message.content))
        .collect::<Vec<_>>()
        .join("\n")
}
