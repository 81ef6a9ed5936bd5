//! Plain-text context log
//!
//! Newest exchange first, capped at a byte limit. Used by the tutor
//! assistant instead of the structured history.

use crate::config::ContextLogConfig;
use crate::Result;
use std::fs;
use std::io::ErrorKind;
use tracing::{debug, warn};

pub struct ContextLog {
    config: ContextLogConfig,
}

impl ContextLog {
    /// Open the log, creating an empty file if none exists yet
    pub fn open(config: ContextLogConfig) -> Result<Self> {
        if !config.path.exists() {
            if let Some(parent) = config.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(&config.path, "")?;
            debug!("Created context log at {}", config.path.display());
        }
        Ok(Self { config })
    }

    pub fn read(&self) -> String {
        match fs::read_to_string(&self.config.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => {
                warn!("Failed to read context log {}: {}", self.config.path.display(), e);
                String::new()
            }
        }
    }

    /// Prepend an exchange and cut the log back to its limit
    pub fn record(&self, query: &str, response: &str) -> Result<()> {
        let mut text = format!("Query: {}\nResponse: {}\n", query, response);
        text.push_str(&self.read());
        truncate_on_char_boundary(&mut text, self.config.limit);
        fs::write(&self.config.path, text)?;
        Ok(())
    }
}

fn truncate_on_char_boundary(text: &mut String, limit: usize) {
    if text.len() <= limit {
        return;
    }
    let mut cut = limit;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}
