//! Scripted completion client for unit tests

use crate::error::ChatError;
use crate::memory::Turn;
use crate::openrouter::{CompletionClient, CompletionOptions};
use crate::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

enum Script {
    Reply(String),
    Fail(fn() -> ChatError),
}

/// Replays queued outcomes in order; the last one repeats forever.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Script>>,
    calls: Mutex<Vec<(Vec<Turn>, CompletionOptions)>>,
}

impl ScriptedClient {
    fn with(script: Vec<Script>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with(vec![Script::Reply(text.to_string())])
    }

    pub fn failing(make: fn() -> ChatError) -> Self {
        Self::with(vec![Script::Fail(make)])
    }

    pub fn sequence(replies: &[&str]) -> Self {
        Self::with(replies.iter().map(|r| Script::Reply(r.to_string())).collect())
    }

    /// Queue a failure after the current script
    pub fn then_fail(self, make: fn() -> ChatError) -> Self {
        self.script.lock().unwrap().push_back(Script::Fail(make));
        self
    }

    pub fn calls(&self) -> Vec<(Vec<Turn>, CompletionOptions)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, messages: &[Turn], options: &CompletionOptions) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), options.clone()));

        let mut script = self.script.lock().unwrap();
        let step = if script.len() > 1 {
            script.pop_front()
        } else {
            None
        };

        match step.as_ref().or(script.front()) {
            Some(Script::Reply(text)) => Ok(text.clone()),
            Some(Script::Fail(make)) => Err(make()),
            None => Err(ChatError::Network("script exhausted".to_string())),
        }
    }
}
