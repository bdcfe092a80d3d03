use std::collections::HashMap;
use std::env;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::rchain::chat_models::ChatOpenAiCompatible;
use crate::rchain::fake::{ExhaustionPolicy, FakeListChatModel};
use crate::rchain::openai::{
    OPENAI_BASE_URL, OPENAI_DEFAULT_MODEL, OPENAI_DEFAULT_TEMPERATURE, OpenAiCompletions,
};
use crate::rchain::provider::{ChatModel, ClientConfig, ProviderKind};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENROUTER_DEFAULT_MODEL: &str = "qwen/qwen2.5-vl-72b-instruct:free";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3.2:latest";
const GATEWAY_DEFAULT_TEMPERATURE: f32 = 0.8;

pub const DEFAULT_FAKE_RESPONSES: [&str; 2] = [
    "Hello",
    "Hi, I'm a useful assistant. How can I help you today?",
];

/// Optional per-provider settings from the config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientOverrides {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FakeOverrides {
    pub responses: Option<Vec<String>>,
    pub on_exhausted: Option<ExhaustionPolicy>,
}

/// Everything the registry needs besides the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryOptions {
    pub openai: ClientOverrides,
    pub openrouter: ClientOverrides,
    pub ollama: ClientOverrides,
    pub fake: FakeOverrides,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Provider '{name}' not found. Supported values: {supported}.")]
    ProviderNotFound { name: String, supported: String },
}

/// Configured model clients, one per provider kind.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, ChatModel>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds every provider from process environment variables.
    pub fn from_env(options: &RegistryOptions) -> Self {
        Self::build(options, |key| env::var(key).ok())
    }

    /// Builds every provider, reading variables through `var`. Clients whose
    /// key is absent are still registered and fail when first invoked.
    pub fn build<F>(options: &RegistryOptions, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| var(key).filter(|value| !value.trim().is_empty());
        let key_for = |kind: ProviderKind| {
            let key = kind.api_key_env().and_then(|key_env| lookup(key_env));
            if key.is_none() && kind.api_key_env().is_some() {
                debug!(provider = %kind, "no API key configured; provider will fail on use");
            }
            key
        };

        let mut registry = Self::new();

        registry.register(ChatModel::Completions(OpenAiCompletions::new(client_config(
            &options.openai,
            OPENAI_DEFAULT_MODEL,
            OPENAI_DEFAULT_TEMPERATURE,
            OPENAI_BASE_URL.to_string(),
            key_for(ProviderKind::Openai),
            options.timeout_secs,
        ))));

        registry.register(ChatModel::Chat(ChatOpenAiCompatible::new(
            ProviderKind::Openrouter,
            client_config(
                &options.openrouter,
                OPENROUTER_DEFAULT_MODEL,
                GATEWAY_DEFAULT_TEMPERATURE,
                OPENROUTER_BASE_URL.to_string(),
                key_for(ProviderKind::Openrouter),
                options.timeout_secs,
            ),
        )));

        let ollama_base = lookup("OLLAMA_HOST")
            .map(|host| ollama_base_url(&host))
            .unwrap_or_else(|| OLLAMA_BASE_URL.to_string());
        registry.register(ChatModel::Chat(ChatOpenAiCompatible::new(
            ProviderKind::Ollama,
            client_config(
                &options.ollama,
                OLLAMA_DEFAULT_MODEL,
                GATEWAY_DEFAULT_TEMPERATURE,
                ollama_base,
                None,
                options.timeout_secs,
            ),
        )));

        let responses = options.fake.responses.clone().unwrap_or_else(|| {
            DEFAULT_FAKE_RESPONSES
                .iter()
                .map(|text| text.to_string())
                .collect()
        });
        registry.register(ChatModel::Fake(FakeListChatModel::new(
            responses,
            options.fake.on_exhausted.unwrap_or_default(),
        )));

        registry
    }

    /// Adds or replaces the client for the model's provider kind.
    pub fn register(&mut self, model: ChatModel) {
        self.providers.insert(model.kind(), model);
    }

    /// Looks a provider up by name, ignoring case.
    pub fn get_model(&self, name: &str) -> Result<&ChatModel, RegistryError> {
        name.parse::<ProviderKind>()
            .ok()
            .and_then(|kind| self.providers.get(&kind))
            .ok_or_else(|| RegistryError::ProviderNotFound {
                name: name.to_string(),
                supported: self.names().join(", "),
            })
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.providers.keys().map(|kind| kind.as_str()).collect();
        names.sort_unstable();
        names
    }
}

fn client_config(
    overrides: &ClientOverrides,
    default_model: &str,
    default_temperature: f32,
    default_base_url: String,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
) -> ClientConfig {
    ClientConfig {
        model: overrides
            .model
            .clone()
            .unwrap_or_else(|| default_model.to_string()),
        temperature: overrides.temperature.unwrap_or(default_temperature),
        base_url: overrides.base_url.clone().unwrap_or(default_base_url),
        api_key,
        timeout_secs,
    }
}

/// Turns an `OLLAMA_HOST` value (`host:port` or a URL) into the
/// OpenAI-compatible base URL.
fn ollama_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{host}/v1")
    } else {
        format!("http://{host}/v1")
    }
}
