//! LLM providers that can turn the raw briefing into a short digest.
//!
//! Each provider makes at most one request per call (the search-augmented
//! provider allows one retry) and reports failure as `None`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::USER_AGENT;

mod anthropic;
mod openai;
mod perplexity;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use perplexity::PerplexityProvider;

pub const LLM_TIMEOUT_SECS: u64 = 60;
pub const MAX_TOKENS: u32 = 1024;

/// Characters of an error body worth keeping in a log line.
const ERROR_BODY_LIMIT: usize = 300;

pub const SYSTEM_PROMPT: &str = "\
You are a crypto morning briefing analyst. Given raw market data, trending coins, \
and news headlines, compile a concise daily digest for Telegram.

Format with these sections using emoji headers:
📊 MARKET MOOD: One word (Bullish/Bearish/Neutral/Mixed) + brief reason (1 sentence)
📰 TOP STORIES: 3-5 most important items from the headlines, each as a bullet
🔥 TRENDING: Notable trending coins with brief context
📈 MACRO: Any macro-relevant news (skip if nothing)
👀 WATCHLIST: 3-5 tickers with one-word sentiment tag

Rules:
- Keep total under 1800 characters
- Use plain text with emoji. No markdown links or formatting
- Be factual. Do not speculate or add information not in the data
- If data is sparse, keep the briefing shorter rather than padding";

#[async_trait]
pub trait SummaryProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Summarize the raw briefing, or `None` if the provider could not.
    async fn summarize(&self, raw: &str) -> Option<String>;
}

pub(crate) fn user_prompt(raw: &str) -> String {
    format!(
        "Here is today's raw crypto market data and news. Create the morning briefing:\n\n{}",
        raw
    )
}

pub(crate) fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(LLM_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")
}

/// Log the outcome of one summarization attempt and keep only a usable text.
pub(crate) fn settle(provider: &str, outcome: Result<Option<String>>) -> Option<String> {
    match outcome {
        Ok(Some(summary)) => {
            info!(
                provider,
                chars = summary.chars().count(),
                "Summarization successful"
            );
            Some(summary)
        }
        Ok(None) => {
            warn!(provider, "Response contained no text");
            None
        }
        Err(e) => {
            warn!(provider, error = %format!("{:#}", e), "Summarization failed");
            None
        }
    }
}

/// Send a prepared request and decode the JSON reply, turning non-2xx
/// statuses into errors that carry the start of the response body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
) -> Result<T> {
    let response = request
        .send()
        .await
        .with_context(|| format!("Failed to send request to {}", provider))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("unknown error"));
        anyhow::bail!(
            "{} API HTTP {}: {}",
            provider,
            status.as_u16(),
            truncate_chars(&error_text, ERROR_BODY_LIMIT)
        );
    }

    response
        .json::<T>()
        .await
        .with_context(|| format!("Failed to parse {} response", provider))
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_end, _)) => &text[..byte_end],
        None => text,
    }
}
