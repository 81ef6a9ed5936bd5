//! Rolling Chat
//!
//! Small chat clients for an OpenRouter-hosted model:
//! - A history-backed chatbot that keeps a sliding window of turns on disk
//!   and folds older turns into a summary when the window overflows
//! - A tutor assistant that keeps a plain-text context log
//! - A connectivity smoke check
//!
//! TURN LOOP:
//! LOAD → ASK → APPEND → SAVE → SUMMARIZE?

pub mod api;
pub mod config;
pub mod conversational;
pub mod diagnostics;
pub mod error;
pub mod memory;
pub mod openrouter;
pub mod prompts;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ChatError, Result};

// Re-export common types
pub use config::ChatConfig;
pub use conversational::{AssistantSession, ChatSession, TurnReply};
pub use memory::{History, HistoryStore, Role, Summarizer, Turn};
pub use openrouter::{CompletionClient, CompletionOptions, OpenRouterClient};
