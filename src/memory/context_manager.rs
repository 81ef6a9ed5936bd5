//! Context Window Management
//!
//! Decides when the stored history has outgrown its window and assembles the
//! message list sent with each query.

use crate::memory::store::Turn;
use tracing::info;

/// Sliding window over the stored history
#[derive(Debug, Clone, Copy)]
pub struct ContextWindow {
    max_messages: usize,
}

impl ContextWindow {
    pub fn new(max_messages: usize) -> Self {
        Self { max_messages }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// True once the history holds more turns than the window allows
    pub fn needs_summarization(&self, history: &[Turn]) -> bool {
        let should = history.len() > self.max_messages;
        if should {
            info!(
                "History at {}/{} turns. Summarization needed.",
                history.len(),
                self.max_messages
            );
        }
        should
    }

    /// System prompt, then stored history, then the new query
    pub fn request_messages(&self, system_prompt: &str, history: &[Turn], query: &str) -> Vec<Turn> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Turn::system(system_prompt));
        messages.extend(history.iter().cloned());
        messages.push(Turn::user(query));
        messages
    }

    pub fn usage(&self, history: &[Turn]) -> WindowUsage {
        WindowUsage {
            turns: history.len(),
            max_messages: self.max_messages,
            summaries: history.iter().filter(|t| t.is_summary()).count(),
            characters: history.iter().map(Turn::char_count).sum(),
        }
    }
}

/// Snapshot of how full the window is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowUsage {
    pub turns: usize,
    pub max_messages: usize,
    pub summaries: usize,
    pub characters: usize,
}

impl std::fmt::Display for WindowUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} turns ({} summary, {} chars)",
            self.turns, self.max_messages, self.summaries, self.characters
        )
    }
}
