//! Conversation Memory
//!
//! Sliding-window history with summarization on overflow, plus the plain
//! context log used by the tutor assistant

pub mod context_log;
pub mod context_manager;
pub mod store;
pub mod summarizer;

pub use context_log::ContextLog;
pub use context_manager::{ContextWindow, WindowUsage};
pub use store::{History, HistoryStore, Role, Turn, SUMMARY_PREFIX};
pub use summarizer::{CompactionPlan, Summarizer, SummarizerConfig};
