//! Conversational interaction handlers
//!
//! `ChatSession` drives one turn of the history-backed chatbot: load, ask,
//! append, persist, and report whether the window overflowed.
//! `AssistantSession` is the simpler tutor that keeps a plain context log.
//! Completion failures come back as display text and are never persisted.

use crate::config::ChatConfig;
use crate::memory::{
    ContextLog, ContextWindow, History, HistoryStore, Summarizer, SummarizerConfig, Turn,
    WindowUsage,
};
use crate::openrouter::{CompletionClient, CompletionOptions};
use crate::Result;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one user query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReply {
    /// Model reply, or the error text to show instead
    pub text: String,
    pub completed: bool,
    /// Full pre-truncation history when the window overflowed
    #[serde(skip)]
    pub overflow: Option<History>,
}

impl TurnReply {
    fn failed(text: String) -> Self {
        Self {
            text,
            completed: false,
            overflow: None,
        }
    }

    pub fn needs_summarization(&self) -> bool {
        self.overflow.is_some()
    }
}

/// History-backed chat with summarization on overflow
pub struct ChatSession {
    client: Arc<dyn CompletionClient>,
    store: HistoryStore,
    window: ContextWindow,
    summarizer: Summarizer,
    system_prompt: String,
    model: String,
    max_tokens: u32,
}

impl ChatSession {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        config: &ChatConfig,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            summarizer: Summarizer::new(client.clone(), SummarizerConfig::default()),
            client,
            store: HistoryStore::new(config.history.clone()),
            window: ContextWindow::new(config.history.max_messages),
            system_prompt: system_prompt.into(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
        info!("Model set to {}", self.model);
    }

    pub fn history(&self) -> History {
        self.store.load()
    }

    pub fn usage(&self) -> WindowUsage {
        self.window.usage(&self.store.load())
    }

    /// Send `query` with the stored history and persist the new exchange.
    ///
    /// The returned reply carries the untruncated history in `overflow` when
    /// the window is now too long; pass it to [`ChatSession::compact`] before
    /// the next turn.
    pub async fn ask(&self, query: &str) -> Result<TurnReply> {
        let mut history = self.store.load();
        let messages = self.window.request_messages(&self.system_prompt, &history, query);
        info!(
            "Sending {} messages ({} history + system + current)",
            messages.len(),
            history.len()
        );

        let options = CompletionOptions::new(&self.model, self.max_tokens);
        let answer = match self.client.complete(&messages, &options).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Completion failed, history left unchanged: {}", e);
                return Ok(TurnReply::failed(e.to_string()));
            }
        };

        history.push(Turn::user(query));
        history.push(Turn::assistant(answer.clone()));

        let overflow = self
            .window
            .needs_summarization(&history)
            .then(|| history.clone());
        let saved = self.store.save(history)?;
        debug!("Saved {} turns", saved.len());

        Ok(TurnReply {
            text: answer,
            completed: true,
            overflow,
        })
    }

    /// Summarize an overflowed history and persist the result
    pub async fn compact(&self, history: History) -> Result<History> {
        info!("Performing summarization of {} turns", history.len());
        let compacted = self.summarizer.summarize(history, &self.model).await;
        self.store.save(compacted)
    }

    pub fn clear(&self) -> Result<()> {
        info!("Clearing conversation history");
        self.store.clear()
    }
}

/// Tutor chat backed by a plain-text context log
pub struct AssistantSession {
    client: Arc<dyn CompletionClient>,
    log: ContextLog,
    system_prompt: String,
    model: String,
    max_tokens: u32,
}

impl AssistantSession {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        config: &ChatConfig,
        system_prompt: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client,
            log: ContextLog::open(config.context_log.clone())?,
            system_prompt: system_prompt.into(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub async fn ask(&self, query: &str) -> Result<TurnReply> {
        let context = self.log.read();
        debug!(
            system_len = self.system_prompt.len(),
            query_len = query.len(),
            context_len = context.len(),
            "Building assistant request"
        );

        let messages = [
            Turn::system(self.system_prompt.as_str()),
            Turn::user(query),
            Turn::assistant(context),
        ];
        let options = CompletionOptions::new(&self.model, self.max_tokens).with_transform("middle-out");

        match self.client.complete(&messages, &options).await {
            Ok(answer) => {
                self.log.record(query, &answer)?;
                Ok(TurnReply {
                    text: answer,
                    completed: true,
                    overflow: None,
                })
            }
            Err(e) => {
                warn!("Assistant completion failed: {}", e);
                Ok(TurnReply::failed(e.to_string()))
            }
        }
    }
}

/// Transcript block shown for each exchange
pub fn render_exchange<Tz>(at: &DateTime<Tz>, query: &str, model: &str, response: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}\n--------------------------\nQuery: {}\n--------------------------\nSelected LLM: {}\n--------------------------\nResponse: {}\n________________________\n",
        at.format("%Y-%m-%d %H:%M:%S"),
        query,
        model,
        response
    )
}
