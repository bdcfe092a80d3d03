use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rchain::ai::{AIMessage, Usage};
use crate::rchain::chat_runtime::{endpoint_url, post_json};
use crate::rchain::provider::{ChatMessage, ClientConfig, ProviderError, ProviderKind};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsagePayload {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

impl From<UsagePayload> for Usage {
    fn from(usage: UsagePayload) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

/// Client for any OpenAI-compatible chat-completions endpoint (OpenRouter,
/// a local Ollama server, ...).
#[derive(Debug, Clone)]
pub struct ChatOpenAiCompatible {
    kind: ProviderKind,
    config: ClientConfig,
    client: Client,
}

impl ChatOpenAiCompatible {
    /// Builds the client without validating credentials.
    pub fn new(kind: ProviderKind, config: ClientConfig) -> Self {
        Self {
            kind,
            config,
            client: Client::new(),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends the messages as one chat-completions request.
    pub async fn invoke(&self, messages: &[ChatMessage]) -> Result<AIMessage, ProviderError> {
        let provider = self.kind;
        let api_key = match (provider.api_key_env(), self.config.api_key.as_deref()) {
            (Some(key_env), None) => {
                return Err(ProviderError::MissingApiKey { provider, key_env });
            }
            (_, key) => key,
        };

        let payload = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
        };
        let url = endpoint_url(&self.config.base_url, "chat/completions");
        debug!(%provider, model = %self.config.model, messages = messages.len(), "dispatching chat completion");

        let body: ChatCompletionResponse = post_json(
            &self.client,
            &url,
            api_key,
            &payload,
            self.config.timeout_secs,
        )
        .await
        .map_err(|failure| failure.into_provider_error(provider))?;

        parse_response(provider, body)
    }
}

fn parse_response(
    provider: ProviderKind,
    body: ChatCompletionResponse,
) -> Result<AIMessage, ProviderError> {
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(ProviderError::EmptyResponse { provider })?;

    Ok(AIMessage {
        content,
        usage: body.usage.map(Usage::from),
    })
}

#[cfg(test)]
mod tests {
    use super::{ChatCompletionRequest, ChatCompletionResponse, ChatOpenAiCompatible, parse_response};
    use crate::rchain::provider::{ChatMessage, ClientConfig, ProviderError, ProviderKind};
    use serde_json::json;

    fn config(api_key: Option<&str>) -> ClientConfig {
        ClientConfig {
            model: "qwen/qwen2.5-vl-72b-instruct:free".to_string(),
            temperature: 0.8,
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: api_key.map(str::to_string),
            timeout_secs: None,
        }
    }

    #[test]
    fn request_carries_model_messages_and_temperature() {
        let messages = [ChatMessage::system("be brief"), ChatMessage::user("hi")];
        let payload = ChatCompletionRequest {
            model: "m",
            messages: &messages,
            temperature: 0.5,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "model": "m",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ],
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn response_content_and_usage_are_extracted() {
        let body: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "Ciao!"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 2, "total_tokens": 14}
        }))
        .unwrap();
        let message = parse_response(ProviderKind::Openrouter, body).unwrap();
        assert_eq!(message.content, "Ciao!");
        assert_eq!(message.usage.and_then(|usage| usage.total_tokens), Some(14));
    }

    #[test]
    fn empty_choices_are_rejected() {
        let body: ChatCompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            parse_response(ProviderKind::Ollama, body),
            Err(ProviderError::EmptyResponse {
                provider: ProviderKind::Ollama
            })
        ));
    }

    #[test]
    fn empty_string_content_is_a_valid_reply() {
        let body: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": ""}}]
        }))
        .unwrap();
        let message = parse_response(ProviderKind::Ollama, body).unwrap();
        assert_eq!(message.content, "");
    }

    #[test]
    fn null_content_is_an_empty_response() {
        let body: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }))
        .unwrap();
        assert!(matches!(
            parse_response(ProviderKind::Openrouter, body),
            Err(ProviderError::EmptyResponse { .. })
        ));
    }

    #[tokio::test]
    async fn missing_key_fails_on_first_invoke() {
        let model = ChatOpenAiCompatible::new(ProviderKind::Openrouter, config(None));
        let err = model
            .invoke(&[ChatMessage::user("hello")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::MissingApiKey {
                provider: ProviderKind::Openrouter,
                key_env: "OPENROUTER_API_KEY"
            }
        ));
    }
}
