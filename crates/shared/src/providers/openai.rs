use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    http_client, send_json, settle, user_prompt, SummaryProvider, MAX_TOKENS, SYSTEM_PROMPT,
};
use crate::config::ModelCredentials;

#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// Trimmed content of the first choice, if any.
    pub(crate) fn first_text(&self) -> Option<String> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

/// Secondary summarizer: OpenAI chat completions.
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    credentials: ModelCredentials,
}

impl OpenAiProvider {
    pub fn new(base_url: impl Into<String>, credentials: ModelCredentials) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    async fn try_summarize(&self, raw: &str) -> Result<Option<String>> {
        let request = ChatRequest {
            model: &self.credentials.model,
            max_tokens: Some(MAX_TOKENS),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(raw),
                },
            ],
        };

        let builder = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.credentials.api_key)
            .json(&request);

        let response: ChatResponse = send_json(self.name(), builder).await?;
        Ok(response.first_text())
    }
}

#[async_trait]
impl SummaryProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "OpenAI"
    }

    async fn summarize(&self, raw: &str) -> Option<String> {
        settle(self.name(), self.try_summarize(raw).await)
    }
}
