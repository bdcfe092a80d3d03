use crate::rchain::ai::AIMessage;

/// Extracts the plain text of a model reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrOutputParser;

impl StrOutputParser {
    /// Returns the content unchanged, whitespace included.
    pub fn parse(&self, message: &AIMessage) -> String {
        message.content.clone()
    }
}
