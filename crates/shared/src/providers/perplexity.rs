use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use super::openai::{ChatMessage, ChatRequest, ChatResponse};
use super::{http_client, send_json, settle, SummaryProvider};
use crate::config::ModelCredentials;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

const NEWS_PROMPT: &str = "\
Search the web for the most important cryptocurrency news from the last 24 hours \
and write a concise morning briefing for Telegram.

Format with these sections using emoji headers:
📊 MARKET MOOD: One word (Bullish/Bearish/Neutral/Mixed) + brief reason (1 sentence)
📰 TOP STORIES: 3-5 most important stories, each as a bullet
📈 MACRO: Any macro-relevant news (skip if nothing)
👀 WATCHLIST: 3-5 tickers with one-word sentiment tag

Rules:
- Keep total under 1800 characters
- Use plain text with emoji. No markdown links or formatting
- Only report what your sources support";

/// Search-augmented summarizer.
///
/// Sends a fixed news prompt instead of the raw market data, and is the only
/// provider allowed a second attempt (after a fixed delay).
pub struct PerplexityProvider {
    client: Client,
    base_url: String,
    credentials: ModelCredentials,
    topics: Option<String>,
    retry_delay: Duration,
}

impl PerplexityProvider {
    pub fn new(
        base_url: impl Into<String>,
        credentials: ModelCredentials,
        topics: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            topics,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn prompt(&self) -> String {
        match &self.topics {
            Some(topics) => format!(
                "{}\n\nAlso cover these watchlist topics: {}",
                NEWS_PROMPT, topics
            ),
            None => NEWS_PROMPT.to_string(),
        }
    }

    async fn try_summarize(&self) -> Result<Option<String>> {
        let request = ChatRequest {
            model: &self.credentials.model,
            max_tokens: None,
            messages: vec![ChatMessage {
                role: "user",
                content: self.prompt(),
            }],
        };

        let builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.credentials.api_key)
            .json(&request);

        let response: ChatResponse = send_json(self.name(), builder).await?;
        Ok(response.first_text())
    }
}

#[async_trait]
impl SummaryProvider for PerplexityProvider {
    fn name(&self) -> &'static str {
        "Perplexity"
    }

    async fn summarize(&self, _raw: &str) -> Option<String> {
        for attempt in 0..2 {
            if let Some(summary) = settle(self.name(), self.try_summarize().await) {
                return Some(summary);
            }

            if attempt == 0 {
                info!(provider = self.name(), delay = ?self.retry_delay, "Retrying once");
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn provider(base_url: String, topics: Option<&str>) -> PerplexityProvider {
        PerplexityProvider::new(
            base_url,
            ModelCredentials {
                api_key: "pplx-test".to_string(),
                model: "sonar".to_string(),
            },
            topics.map(str::to_string),
        )
        .unwrap()
        .with_retry_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_success_makes_one_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer pplx-test")
                    .body_contains("Also cover these watchlist topics: ETF flows");
                then.status(200).json_body(json!({
                    "choices": [ { "message": { "content": "📰 TOP STORIES: ETF inflows" } } ]
                }));
            })
            .await;

        let summary = provider(server.base_url(), Some("ETF flows")).summarize("ignored").await;

        mock.assert_hits_async(1).await;
        assert_eq!(summary.as_deref(), Some("📰 TOP STORIES: ETF inflows"));
    }

    #[tokio::test]
    async fn test_failure_retries_exactly_once() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(503).body("busy");
            })
            .await;

        let summary = provider(server.base_url(), None).summarize("ignored").await;

        assert!(summary.is_none());
        mock.assert_hits_async(2).await;
    }

    #[test]
    fn test_prompt_without_topics() {
        let prompt = provider("http://127.0.0.1:9".to_string(), None).prompt();
        assert!(prompt.starts_with("Search the web"));
        assert!(!prompt.contains("watchlist topics:"));
    }
}
