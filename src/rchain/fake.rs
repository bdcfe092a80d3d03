use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;
use tracing::debug;

use crate::rchain::ai::AIMessage;
use crate::rchain::provider::{ChatMessage, ProviderError, ProviderKind};

/// What the fake model returns once every canned response has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExhaustionPolicy {
    /// Start again from the first response.
    #[default]
    Cycle,
    /// Keep returning the last response.
    RepeatLast,
    /// Fail with [`ProviderError::FakeExhausted`].
    Fail,
}

/// Model returning canned responses in order, ignoring its input.
#[derive(Debug)]
pub struct FakeListChatModel {
    responses: Vec<String>,
    policy: ExhaustionPolicy,
    calls: AtomicUsize,
}

impl FakeListChatModel {
    pub fn new(responses: Vec<String>, policy: ExhaustionPolicy) -> Self {
        Self {
            responses,
            policy,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of invocations so far, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn invoke(&self, _messages: &[ChatMessage]) -> Result<AIMessage, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let count = self.responses.len();
        if count == 0 {
            return Err(ProviderError::EmptyResponse {
                provider: ProviderKind::Fake,
            });
        }

        let index = match self.policy {
            ExhaustionPolicy::Cycle => call % count,
            ExhaustionPolicy::RepeatLast => call.min(count - 1),
            ExhaustionPolicy::Fail if call >= count => {
                return Err(ProviderError::FakeExhausted { count });
            }
            ExhaustionPolicy::Fail => call,
        };
        debug!(call, index, "fake model answering");
        Ok(AIMessage::new(self.responses[index].clone()))
    }
}
