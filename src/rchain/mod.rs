//! Lightweight LLM integration helpers.
//!
//! Typed clients for the supported chat backends, prompt templates, output
//! parsing and the registry that maps provider names to configured clients.

/// Assistant reply types.
pub mod ai;
/// Prompt, model and parser composed into one callable.
pub mod chain;
/// OpenAI-compatible chat-completions client.
pub mod chat_models;
pub(crate) mod chat_runtime;
/// Canned-response model for offline runs and tests.
pub mod fake;
/// OpenAI text-completions client.
pub mod openai;
/// Reply-to-text conversion.
pub mod output_parsers;
/// Chat prompt templates with named placeholders.
pub mod prompts;
/// Provider kinds, messages and model dispatch.
pub mod provider;
/// Name-to-client lookup built at startup.
pub mod registry;
