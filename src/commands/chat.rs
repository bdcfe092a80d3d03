use clap::Args;
use thiserror::Error;
use tokio::io::{self, BufReader};
use tracing::{debug, info};

use crate::config::{self, ConfigError};
use crate::conversation::{self, ConversationError};
use crate::rchain::chain::Chain;
use crate::rchain::output_parsers::StrOutputParser;
use crate::rchain::prompts::PromptError;
use crate::rchain::registry::{ProviderRegistry, RegistryError};

#[derive(Debug, Args, Clone, Default)]
pub struct ChatArgs {
    /// Provider to talk to: openai, openrouter, ollama or fake (case-insensitive).
    #[arg(long)]
    pub provider: Option<String>,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("invalid persona template: {0}")]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Conversation(#[from] ConversationError),
}

/// Runs the interactive loop on stdin/stdout until `exit`.
pub async fn run(args: ChatArgs) -> Result<(), ChatError> {
    let loaded = config::load()?;
    debug!(path = %loaded.path.display(), found = loaded.found, "config resolved");

    let provider = config::resolve_provider(args.provider.as_deref(), &loaded.file)?;
    let registry = ProviderRegistry::from_env(&loaded.file.registry_options());
    let model = registry.get_model(&provider)?;
    info!(provider = %model.kind(), "provider selected");

    let persona = &loaded.file.persona;
    let chain = Chain::new(persona.prompt_template()?, model, StrOutputParser);

    let mut input = BufReader::new(io::stdin());
    let mut output = io::stdout();
    let termination = conversation::run(&chain, persona, &mut input, &mut output).await?;
    debug!(?termination, "conversation finished");
    Ok(())
}
