//! Runtime configuration
//!
//! Everything is read from the process environment (after `.env` has been
//! loaded by the binary). Paths and limits travel as explicit config values
//! into the store, log, and summarizer constructors.

use crate::error::ChatError;
use crate::Result;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_HISTORY_FILE: &str = "message_history.json";
pub const DEFAULT_MAX_MESSAGES: usize = 7;
pub const DEFAULT_MAX_TOKENS: u32 = 3000;
pub const DEFAULT_CONTEXT_FILE: &str = "context.txt";
pub const DEFAULT_CONTEXT_LIMIT: usize = 5000;
pub const DEFAULT_PORT: u16 = 8080;

/// Models offered for selection. The first entry is the default.
pub const MODEL_CATALOGUE: &[&str] = &[
    "deepseek/deepseek-v3.2",
    "google/gemini-2.5-flash-lite",
    "openai/gpt-4.1-nano",
    "anthropic/claude-opus-4.5",
    "anthropic/claude-sonnet-4.5",
    "x-ai/grok-code-fast-1",
    "x-ai/grok-4.1-fast",
    "mistralai/devstral-2512:free",
    "mistralai/mistral-small-3.1-24b-instruct:free",
    "openai/o4-mini",
    "openai/gpt-4o-mini",
    "openai/gpt-5.2",
    "minimax/minimax-m2",
    "google/gemma-3-27b-it",
    "google/gemini-2.5-flash",
    "tngtech/deepseek-r1t2-chimera:free",
    "qwen/qwen3-coder:free",
    "google/gemma-3-27b-it:free",
    "openai/gpt-oss-20b:free",
    "openai/gpt-oss-120b:free",
    "meta-llama/llama-3.3-70b-instruct:free",
    "meituan/longcat-flash-chat:free",
    "nousresearch/hermes-3-llama-3.1-405b:free",
    "moonshotai/kimi-k2:free",
    "cognitivecomputations/dolphin-mistral-24b-venice-edition:free",
];

pub fn default_model() -> String {
    MODEL_CATALOGUE[0].to_string()
}

/// Where the sliding-window history lives and how long it may grow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    pub path: PathBuf,
    pub max_messages: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_HISTORY_FILE),
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }
}

/// Plain-text context log used by the tutor assistant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextLogConfig {
    pub path: PathBuf,
    /// Maximum log size in bytes
    pub limit: usize,
}

impl Default for ContextLogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CONTEXT_FILE),
            limit: DEFAULT_CONTEXT_LIMIT,
        }
    }
}

/// Top-level configuration shared by all binaries
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Bearer token; `None` is reported to the user and blocks requests
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub history: HistoryConfig,
    pub context_log: ContextLogConfig,
    pub port: u16,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: default_model(),
            max_tokens: DEFAULT_MAX_TOKENS,
            history: HistoryConfig::default(),
            context_log: ContextLogConfig::default(),
            port: DEFAULT_PORT,
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            api_key: get("OPENROUTER_API_KEY"),
            endpoint: get("OPENROUTER_URL").unwrap_or(defaults.endpoint),
            model: get("CHAT_MODEL").unwrap_or(defaults.model),
            max_tokens: parse_var("CHAT_MAX_TOKENS", get("CHAT_MAX_TOKENS"), defaults.max_tokens)?,
            history: HistoryConfig {
                path: get("CHAT_HISTORY_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.history.path),
                max_messages: parse_var(
                    "CHAT_MAX_MESSAGES",
                    get("CHAT_MAX_MESSAGES"),
                    defaults.history.max_messages,
                )?,
            },
            context_log: ContextLogConfig {
                path: get("CONTEXT_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.context_log.path),
                limit: parse_var("CONTEXT_LIMIT", get("CONTEXT_LIMIT"), defaults.context_log.limit)?,
            },
            port: parse_var("PORT", get("PORT").or_else(|| get("API_PORT")), defaults.port)?,
        })
    }

    /// The API key, or the error shown when it is missing
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            ChatError::Config("OPENROUTER_API_KEY not found in environment or .env file".to_string())
        })
    }
}

fn parse_var<T: FromStr>(name: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ChatError::Config(format!("{} has invalid value '{}'", name, raw))),
        None => Ok(default),
    }
}
