//! Terminal chat client for hosted, local and fake LLM backends.

pub mod commands;
pub mod config;
pub mod conversation;
pub mod logging;
pub mod persona;
pub mod rchain;
