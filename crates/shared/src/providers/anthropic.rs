use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    http_client, send_json, settle, user_prompt, SummaryProvider, MAX_TOKENS, SYSTEM_PROMPT,
};
use crate::config::ModelCredentials;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Primary summarizer: Anthropic Messages API.
pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    credentials: ModelCredentials,
}

impl AnthropicProvider {
    pub fn new(base_url: impl Into<String>, credentials: ModelCredentials) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    async fn try_summarize(&self, raw: &str) -> Result<Option<String>> {
        let request = ClaudeRequest {
            model: &self.credentials.model,
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: user_prompt(raw),
            }],
        };

        let builder = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.credentials.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request);

        let response: ClaudeResponse = send_json(self.name(), builder).await?;

        let texts: Vec<&str> = response
            .content
            .iter()
            .filter(|c| c.kind == "text")
            .map(|c| c.text.as_str())
            .collect();

        let summary = texts.join("\n").trim().to_string();
        Ok(Some(summary).filter(|s| !s.is_empty()))
    }
}

#[async_trait]
impl SummaryProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "Claude"
    }

    async fn summarize(&self, raw: &str) -> Option<String> {
        settle(self.name(), self.try_summarize(raw).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn provider(server: &MockServer) -> AnthropicProvider {
        AnthropicProvider::new(
            server.base_url(),
            ModelCredentials {
                api_key: "ak-test".to_string(),
                model: "claude-test".to_string(),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_joins_text_blocks() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/messages")
                    .header("x-api-key", "ak-test")
                    .header("anthropic-version", "2023-06-01")
                    .json_body_partial(r#"{"model": "claude-test", "max_tokens": 1024}"#);
                then.status(200).json_body(json!({
                    "content": [
                        { "type": "text", "text": "📊 MARKET MOOD: Bullish" },
                        { "type": "tool_use", "id": "x" },
                        { "type": "text", "text": "🔥 TRENDING: PEPE\n" }
                    ]
                }));
            })
            .await;

        let summary = provider(&server).summarize("raw data").await;

        mock.assert_async().await;
        assert_eq!(
            summary.as_deref(),
            Some("📊 MARKET MOOD: Bullish\n🔥 TRENDING: PEPE")
        );
    }

    #[tokio::test]
    async fn test_empty_content_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(200).json_body(json!({ "content": [] }));
            })
            .await;

        assert!(provider(&server).summarize("raw data").await.is_none());
    }

    #[tokio::test]
    async fn test_http_error_is_none_after_one_attempt() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(529).body(r#"{"type":"error","error":{"type":"overloaded_error"}}"#);
            })
            .await;

        assert!(provider(&server).summarize("raw data").await.is_none());
        mock.assert_hits_async(1).await;
    }
}
