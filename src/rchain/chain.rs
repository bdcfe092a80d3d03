use thiserror::Error;
use tracing::debug;

use crate::rchain::output_parsers::StrOutputParser;
use crate::rchain::prompts::{ChatPromptTemplate, PromptError, PromptValues};
use crate::rchain::provider::{ChatModel, ProviderError};

#[derive(Debug, Error)]
pub enum ChainError {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Prompt template, model and output parser run in sequence.
#[derive(Debug)]
pub struct Chain<'m> {
    prompt: ChatPromptTemplate,
    model: &'m ChatModel,
    parser: StrOutputParser,
}

impl<'m> Chain<'m> {
    pub fn new(prompt: ChatPromptTemplate, model: &'m ChatModel, parser: StrOutputParser) -> Self {
        Self {
            prompt,
            model,
            parser,
        }
    }

    /// Renders the prompt with `values`, calls the model once and returns the
    /// reply text.
    pub async fn invoke(&self, values: &PromptValues) -> Result<String, ChainError> {
        let messages = self.prompt.format_messages(values)?;
        let reply = self.model.invoke(&messages).await?;
        if let Some(usage) = &reply.usage {
            debug!(
                provider = %self.model.kind(),
                prompt_tokens = ?usage.prompt_tokens,
                completion_tokens = ?usage.completion_tokens,
                total_tokens = ?usage.total_tokens,
                "token usage"
            );
        }
        Ok(self.parser.parse(&reply))
    }
}
