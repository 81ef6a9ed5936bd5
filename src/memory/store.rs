//! Conversation history storage
//!
//! Turns are kept as a JSON array on disk, rewritten wholesale on every save
//! and capped at the configured number of messages.

use crate::config::HistoryConfig;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use tracing::{debug, warn};

pub const SUMMARY_PREFIX: &str = "Previous conversation summary: ";

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// User and assistant turns are the conversation proper
    pub fn is_dialogue(&self) -> bool {
        matches!(self, Role::User | Role::Assistant)
    }
}

/// A single message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Synthetic turn standing in for a collapsed stretch of conversation
    pub fn summary(summary_text: &str) -> Self {
        Self::assistant(format!("{}{}", SUMMARY_PREFIX, summary_text))
    }

    pub fn is_summary(&self) -> bool {
        self.role == Role::Assistant && self.content.starts_with(SUMMARY_PREFIX)
    }

    /// Length in characters, not bytes
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Chronologically ordered turns
pub type History = Vec<Turn>;

/// File-backed history with a fixed message cap
#[derive(Debug, Clone)]
pub struct HistoryStore {
    config: HistoryConfig,
}

impl HistoryStore {
    pub fn new(config: HistoryConfig) -> Self {
        Self { config }
    }

    pub fn max_messages(&self) -> usize {
        self.config.max_messages
    }

    /// Read the persisted history. Missing or unreadable data yields an empty history.
    pub fn load(&self) -> History {
        let raw = match fs::read_to_string(&self.config.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No history file at {}", self.config.path.display());
                return History::new();
            }
            Err(e) => {
                warn!("Failed to read history file {}: {}", self.config.path.display(), e);
                return History::new();
            }
        };

        match serde_json::from_str::<History>(&raw) {
            Ok(history) => history,
            Err(e) => {
                warn!(
                    "History file {} is malformed, starting empty: {}",
                    self.config.path.display(),
                    e
                );
                History::new()
            }
        }
    }

    /// Persist the most recent `max_messages` turns and return them.
    pub fn save(&self, mut history: History) -> Result<History> {
        let max = self.config.max_messages;
        if history.len() > max {
            let excess = history.len() - max;
            history.drain(..excess);
            debug!("Pruned {} oldest turns before saving", excess);
        }

        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&history)?;
        fs::write(&self.config.path, json)?;

        Ok(history)
    }

    pub fn clear(&self) -> Result<()> {
        self.save(History::new())?;
        Ok(())
    }
}
