//! Interactive read-eval-print loop.

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::persona::Persona;
use crate::rchain::chain::{Chain, ChainError};

/// Line that ends the conversation. Compared exactly.
pub const EXIT_SENTINEL: &str = "exit";
pub const PROMPT_PREFIX: &str = "You: ";

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The sentinel line was entered.
    Sentinel,
    /// Input closed before the sentinel.
    EndOfInput,
}

/// Runs turns until the sentinel or end of input. Each turn is independent:
/// the full persona prompt is rendered and sent again with only the new line.
pub async fn run<R, W>(
    chain: &Chain<'_>,
    persona: &Persona,
    input: &mut R,
    output: &mut W,
) -> Result<Termination, ConversationError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut turn = 0usize;
    loop {
        output.write_all(PROMPT_PREFIX.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = read_line(input).await? else {
            debug!(turns = turn, "input closed");
            return Ok(Termination::EndOfInput);
        };
        if line == EXIT_SENTINEL {
            debug!(turns = turn, "exit requested");
            return Ok(Termination::Sentinel);
        }

        turn += 1;
        debug!(turn, chars = line.chars().count(), "dispatching turn");
        let reply = chain.invoke(&persona.turn_values(&line)).await?;

        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
}

/// Reads one line without its terminator; `None` at end of input.
async fn read_line<R>(input: &mut R) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Some(line))
}
