/// Token accounting reported by the upstream API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

/// Assistant message returned by chat models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AIMessage {
    /// Natural language content.
    pub content: String,
    /// Token usage, when the provider reports it.
    pub usage: Option<Usage>,
}

impl AIMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}
