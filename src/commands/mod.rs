//! Subcommand entry points shared by the binary.

/// Interactive chat loop.
pub mod chat;
/// `config` subcommand.
pub mod config;
