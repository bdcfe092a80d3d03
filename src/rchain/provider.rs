use std::fmt;
use std::str::FromStr;

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::rchain::ai::AIMessage;
use crate::rchain::chat_models::ChatOpenAiCompatible;
use crate::rchain::fake::FakeListChatModel;
use crate::rchain::openai::OpenAiCompletions;

/// Closed set of backends the registry knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Openai,
    Openrouter,
    Ollama,
    Fake,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Openai,
        ProviderKind::Openrouter,
        ProviderKind::Ollama,
        ProviderKind::Fake,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Openrouter => "openrouter",
            Self::Ollama => "ollama",
            Self::Fake => "fake",
        }
    }

    /// Environment variable holding the API key, for kinds that need one.
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::Openai => Some("OPENAI_API_KEY"),
            Self::Openrouter => Some("OPENROUTER_API_KEY"),
            Self::Ollama | Self::Fake => None,
        }
    }

    pub fn supported_names() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a name does not match any [`ProviderKind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider '{0}'")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "openai" => Ok(Self::Openai),
            "openrouter" => Ok(Self::Openrouter),
            "ollama" => Ok(Self::Ollama),
            "fake" => Ok(Self::Fake),
            _ => Err(UnknownProvider(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

impl Role {
    /// Prefix used when a conversation is flattened into a text prompt.
    pub fn transcript_prefix(self) -> &'static str {
        match self {
            Self::System => "System",
            Self::User => "Human",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Connection settings shared by the HTTP-backed providers.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
    /// `None` when the credential was absent at startup.
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{key_env} is not set in the environment (required by provider '{provider}')")]
    MissingApiKey {
        provider: ProviderKind,
        key_env: &'static str,
    },
    #[error("{provider} request failed: {source}")]
    Request {
        provider: ProviderKind,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: ProviderKind,
        status: StatusCode,
        body: String,
    },
    #[error("{provider} response did not contain message content")]
    EmptyResponse { provider: ProviderKind },
    #[error("fake provider exhausted its {count} canned responses")]
    FakeExhausted { count: usize },
}

/// A configured model client. One variant per provider family.
#[derive(Debug)]
pub enum ChatModel {
    Completions(OpenAiCompletions),
    Chat(ChatOpenAiCompatible),
    Fake(FakeListChatModel),
}

impl ChatModel {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Completions(model) => model.kind(),
            Self::Chat(model) => model.kind(),
            Self::Fake(_) => ProviderKind::Fake,
        }
    }

    /// Sends one prompt and returns the assistant reply.
    pub async fn invoke(&self, messages: &[ChatMessage]) -> Result<AIMessage, ProviderError> {
        match self {
            Self::Completions(model) => model.invoke(messages).await,
            Self::Chat(model) => model.invoke(messages).await,
            Self::Fake(model) => model.invoke(messages),
        }
    }
}
