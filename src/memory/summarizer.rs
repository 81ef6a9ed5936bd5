//! Context Summarization
//!
//! Collapses everything but the latest user/assistant exchange into one
//! synthetic summary turn via a single completion call. Failures leave the
//! history untouched.

use crate::memory::store::{History, Role, Turn};
use crate::openrouter::{CompletionClient, CompletionOptions};
use std::sync::Arc;
use tracing::{debug, info, warn};

const SUMMARY_INSTRUCTION: &str = "You are a helpful assistant that summarizes conversations concisely. \
Create a single comprehensive summary that captures the key points, context, and important details \
from the conversation history. Respond only with the summarized text.";

/// Tuning for the summarization call
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizerConfig {
    /// Histories shorter than this are never summarized
    pub min_history_len: usize,
    /// Fraction of the collapsed character count used as the token budget
    pub compression_ratio: f32,
    /// Floor for the token budget
    pub min_target_tokens: u32,
    pub temperature: f32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            min_history_len: 3,
            compression_ratio: 0.15,
            min_target_tokens: 100,
            temperature: 0.3,
        }
    }
}

/// Most recent user and assistant turn positions, filled by one reverse scan
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct RecentExchange {
    user: Option<usize>,
    assistant: Option<usize>,
}

impl RecentExchange {
    fn scan(history: &[Turn]) -> Self {
        let mut slots = Self::default();

        for (idx, turn) in history.iter().enumerate().rev() {
            match turn.role {
                Role::User if slots.user.is_none() => slots.user = Some(idx),
                Role::Assistant if slots.assistant.is_none() => slots.assistant = Some(idx),
                _ => {}
            }
            if slots.user.is_some() && slots.assistant.is_some() {
                break;
            }
        }

        slots
    }

    fn contains(&self, idx: usize) -> bool {
        self.user == Some(idx) || self.assistant == Some(idx)
    }
}

/// What a summarization round would collapse and keep
#[derive(Debug, Clone, PartialEq)]
pub struct CompactionPlan {
    pub system: Option<Turn>,
    pub older: Vec<Turn>,
    pub recent_user: Turn,
    pub recent_assistant: Turn,
    pub target_tokens: u32,
}

impl CompactionPlan {
    /// Rebuild the history around a summary of `older`
    pub fn apply(self, summary_text: &str) -> History {
        let mut compacted = Vec::with_capacity(4);
        compacted.extend(self.system);
        compacted.push(Turn::summary(summary_text));
        compacted.push(self.recent_user);
        compacted.push(self.recent_assistant);
        compacted
    }
}

/// Summarizes older turns using the completion API
pub struct Summarizer {
    client: Arc<dyn CompletionClient>,
    config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(client: Arc<dyn CompletionClient>, config: SummarizerConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    /// Decide whether and how `history` can be compacted. `None` means leave it alone.
    pub fn plan(&self, history: &[Turn]) -> Option<CompactionPlan> {
        if history.len() < self.config.min_history_len {
            debug!("Cannot summarize: only {} turns", history.len());
            return None;
        }

        let recent = RecentExchange::scan(history);
        let (Some(user_idx), Some(assistant_idx)) = (recent.user, recent.assistant) else {
            debug!("Cannot summarize: no recent user/assistant pair");
            return None;
        };

        let older: Vec<Turn> = history
            .iter()
            .enumerate()
            .filter(|(idx, turn)| turn.role.is_dialogue() && !recent.contains(*idx))
            .map(|(_, turn)| turn.clone())
            .collect();

        if older.is_empty() {
            debug!("Cannot summarize: no older turns");
            return None;
        }

        Some(CompactionPlan {
            system: history.iter().find(|t| t.role == Role::System).cloned(),
            target_tokens: self.target_tokens(&older),
            older,
            recent_user: history[user_idx].clone(),
            recent_assistant: history[assistant_idx].clone(),
        })
    }

    /// Token budget: a fixed share of the collapsed text, never below the floor
    pub fn target_tokens(&self, older: &[Turn]) -> u32 {
        let chars: usize = older
            .iter()
            .filter(|t| t.role.is_dialogue())
            .map(Turn::char_count)
            .sum();
        let scaled = (chars as f64 * self.config.compression_ratio as f64) as u32;
        scaled.max(self.config.min_target_tokens)
    }

    /// Summarize all but the most recent exchange. Returns `history` unchanged
    /// when there is nothing to collapse or the completion call fails.
    pub async fn summarize(&self, history: History, model: &str) -> History {
        info!("Starting summarization of {} turns", history.len());

        let Some(plan) = self.plan(&history) else {
            return history;
        };

        let mut request = Vec::with_capacity(plan.older.len() + 1);
        request.push(Turn::system(SUMMARY_INSTRUCTION));
        request.extend(plan.older.iter().cloned());

        let options = CompletionOptions::new(model, plan.target_tokens)
            .with_temperature(self.config.temperature);

        debug!(
            older = plan.older.len(),
            target_tokens = plan.target_tokens,
            "Requesting summary"
        );

        match self.client.complete(&request, &options).await {
            Ok(summary_text) => {
                let collapsed = plan.older.len();
                let compacted = plan.apply(&summary_text);
                info!(
                    "Summarized {} older turns; {} -> {} turns",
                    collapsed,
                    history.len(),
                    compacted.len()
                );
                compacted
            }
            Err(e) => {
                warn!("Summarization skipped: {}", e);
                history
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use crate::test_support::ScriptedClient;

    fn six_turns() -> History {
        vec![
            Turn::user("a"),
            Turn::assistant("b"),
            Turn::user("c"),
            Turn::assistant("d"),
            Turn::user("e"),
            Turn::assistant("f"),
        ]
    }

    fn summarizer(client: Arc<ScriptedClient>) -> Summarizer {
        Summarizer::new(client, SummarizerConfig::default())
    }

    #[test]
    fn test_recent_exchange_scan() {
        let history = vec![
            Turn::user("1"),
            Turn::assistant("2"),
            Turn::user("3"),
            Turn::system("s"),
        ];
        let recent = RecentExchange::scan(&history);
        assert_eq!(recent.user, Some(2));
        assert_eq!(recent.assistant, Some(1));
    }

    #[tokio::test]
    async fn test_short_history_is_identity() {
        let client = Arc::new(ScriptedClient::replying("unused"));
        let s = summarizer(client.clone());

        for history in [
            vec![],
            vec![Turn::user("a")],
            vec![Turn::user("a"), Turn::assistant("b")],
        ] {
            assert_eq!(s.summarize(history.clone(), "m").await, history);
        }
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_role_is_identity() {
        let client = Arc::new(ScriptedClient::replying("unused"));
        let s = summarizer(client.clone());

        let users_only = vec![Turn::user("a"), Turn::user("b"), Turn::user("c")];
        assert_eq!(s.summarize(users_only.clone(), "m").await, users_only);

        let no_user = vec![Turn::system("s"), Turn::assistant("b"), Turn::assistant("c")];
        assert_eq!(s.summarize(no_user.clone(), "m").await, no_user);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_older_turns_is_identity() {
        let client = Arc::new(ScriptedClient::replying("unused"));
        let s = summarizer(client.clone());

        let history = vec![Turn::system("s"), Turn::user("a"), Turn::assistant("b")];
        assert_eq!(s.summarize(history.clone(), "m").await, history);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_collapses_to_summary_plus_latest_exchange() {
        let client = Arc::new(ScriptedClient::replying("a asked, b answered"));
        let s = summarizer(client.clone());

        let result = s.summarize(six_turns(), "google/gemma-3-27b-it").await;

        assert_eq!(
            result,
            vec![
                Turn::assistant("Previous conversation summary: a asked, b answered"),
                Turn::user("e"),
                Turn::assistant("f"),
            ]
        );

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        let (messages, options) = &calls[0];
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(&messages[1..], &six_turns()[..4]);
        assert_eq!(options.model, "google/gemma-3-27b-it");
        assert_eq!(options.temperature, Some(0.3));
        assert_eq!(options.max_tokens, 100);
    }

    #[tokio::test]
    async fn test_system_turn_is_kept_first() {
        let client = Arc::new(ScriptedClient::replying("recap"));
        let s = summarizer(client);

        let mut history = vec![Turn::system("persona")];
        history.extend(six_turns());
        let result = s.summarize(history, "m").await;

        assert_eq!(result.len(), 4);
        assert_eq!(result[0], Turn::system("persona"));
        assert!(result[1].is_summary());
        assert_eq!(result[2], Turn::user("e"));
        assert_eq!(result[3], Turn::assistant("f"));
    }

    #[tokio::test]
    async fn test_failure_returns_original_history() {
        let client = Arc::new(ScriptedClient::failing(|| ChatError::Api("overloaded".into())));
        let s = summarizer(client.clone());

        let result = s.summarize(six_turns(), "m").await;
        assert_eq!(result, six_turns());
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_target_tokens_scales_with_text() {
        let s = summarizer(Arc::new(ScriptedClient::replying("")));
        assert_eq!(s.target_tokens(&[Turn::user("short")]), 100);

        let long = vec![Turn::user("x".repeat(1000)), Turn::assistant("y".repeat(1000))];
        assert_eq!(s.target_tokens(&long), 300);
    }

    #[test]
    fn test_plan_preserves_latest_pair_when_user_is_last() {
        let s = summarizer(Arc::new(ScriptedClient::replying("")));
        let history = vec![
            Turn::user("a"),
            Turn::assistant("b"),
            Turn::assistant("c"),
            Turn::user("d"),
        ];

        let plan = s.plan(&history).unwrap();
        assert_eq!(plan.recent_user, Turn::user("d"));
        assert_eq!(plan.recent_assistant, Turn::assistant("c"));
        assert_eq!(plan.older, vec![Turn::user("a"), Turn::assistant("b")]);
    }

    #[test]
    fn test_plan_keeps_duplicate_content_by_position() {
        let s = summarizer(Arc::new(ScriptedClient::replying("")));
        let history = vec![
            Turn::user("same"),
            Turn::assistant("same"),
            Turn::user("same"),
            Turn::assistant("same"),
        ];

        let plan = s.plan(&history).unwrap();
        assert_eq!(plan.older.len(), 2);
    }
}
