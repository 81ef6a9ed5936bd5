//! OpenRouter chat-completion client
//!
//! One POST per call, bearer-token auth, first choice's content returned.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::ChatError;
use crate::memory::Turn;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

/// Per-request knobs for a completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    /// OpenRouter prompt transforms, e.g. `middle-out`
    pub transforms: Vec<String>,
}

impl CompletionOptions {
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            temperature: None,
            transforms: Vec::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_transform(mut self, transform: impl Into<String>) -> Self {
        self.transforms.push(transform.into());
        self
    }
}

/// Anything that can turn a message list into a reply
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: &[Turn], options: &CompletionOptions) -> Result<String>;
}

/// Reusable OpenRouter client (connection-pooled)
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl OpenRouterClient {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|e| ChatError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(&self, messages: &[Turn], options: &CompletionOptions) -> Result<String> {
        let request = CompletionRequest {
            model: &options.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            transforms: &options.transforms,
        };

        info!(
            model = %options.model,
            messages = messages.len(),
            max_tokens = options.max_tokens,
            "Calling completion API"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Completion request failed: {}", e);
                ChatError::Network(e.to_string())
            })?;

        let status = response.status();
        debug!("Completion response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Completion API error response: {} {}", status, body);
            return Err(ChatError::Http {
                status: status.as_u16(),
                body,
            });
        }

        extract_content(&body)
    }
}

/// Pull the first choice's content out of a response body
pub fn extract_content(body: &str) -> Result<String> {
    let parsed: CompletionResponse = serde_json::from_str(body).map_err(|e| {
        error!("Failed to parse completion response: {}", e);
        ChatError::Parse(e.to_string())
    })?;

    if let Some(err) = parsed.error {
        return Err(ChatError::Api(api_error_message(&err)));
    }

    parsed
        .choices
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| ChatError::Parse("missing choices[0].message.content".to_string()))
}

fn api_error_message(err: &serde_json::Value) -> String {
    match err.get("message").and_then(|m| m.as_str()) {
        Some(message) => message.to_string(),
        None => match err {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "no_transforms")]
    transforms: &'a [String],
}

fn no_transforms(transforms: &&[String]) -> bool {
    transforms.is_empty()
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Option<Vec<Choice>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let messages = vec![Turn::system("be brief"), Turn::user("hello")];
        let request = CompletionRequest {
            model: "openai/gpt-4o-mini",
            messages: &messages,
            max_tokens: 3000,
            temperature: None,
            transforms: &[],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "openai/gpt-4o-mini");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["max_tokens"], 3000);
        assert!(value.get("temperature").is_none());
        assert!(value.get("transforms").is_none());
    }

    #[test]
    fn test_extract_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hi there"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "hi there");
    }

    #[test]
    fn test_extract_api_error() {
        let body = r#"{"error":{"code":429,"message":"Rate limit exceeded"}}"#;
        let err = extract_content(body).unwrap_err();
        assert_eq!(err.to_string(), "API Error: Rate limit exceeded");

        let err = extract_content(r#"{"error":"quota"}"#).unwrap_err();
        assert_eq!(err.to_string(), "API Error: quota");
    }

    #[test]
    fn test_extract_missing_fields() {
        assert!(matches!(extract_content(r#"{"choices":[]}"#), Err(ChatError::Parse(_))));
        assert!(matches!(extract_content(r#"{}"#), Err(ChatError::Parse(_))));
        assert!(matches!(extract_content("<html>"), Err(ChatError::Parse(_))));
    }

    #[tokio::test]
    async fn test_complete_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "google/gemma-3-27b-it",
                "max_tokens": 120,
                "temperature": 0.3,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"summary text"}}]}"#)
            .create_async()
            .await;

        let client = OpenRouterClient::new(
            "sk-test",
            format!("{}/api/v1/chat/completions", server.url()),
        )
        .unwrap();
        let options = CompletionOptions::new("google/gemma-3-27b-it", 120).with_temperature(0.3);

        let reply = client.complete(&[Turn::user("hi")], &options).await.unwrap();
        assert_eq!(reply, "summary text");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_sends_transforms() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "transforms": ["middle-out"] })))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
            .create_async()
            .await;

        let client = OpenRouterClient::new("sk-test", format!("{}/", server.url())).unwrap();
        let options = CompletionOptions::new("m", 10).with_transform("middle-out");

        assert_eq!(client.complete(&[], &options).await.unwrap(), "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_http_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(500)
            .with_body("upstream down")
            .create_async()
            .await;

        let client = OpenRouterClient::new("sk-test", format!("{}/", server.url())).unwrap();
        let err = client
            .complete(&[Turn::user("hi")], &CompletionOptions::new("m", 10))
            .await
            .unwrap_err();

        match err {
            ChatError::Http { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "upstream down");
            }
            other => panic!("expected HTTP error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_network_failure() {
        // Port 9 (discard) on localhost is not listening in test environments
        let client = OpenRouterClient::new("sk-test", "http://127.0.0.1:9/").unwrap();
        let err = client
            .complete(&[Turn::user("hi")], &CompletionOptions::new("m", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Network(_)));
        assert!(err.to_string().starts_with("Error: "));
    }
}
