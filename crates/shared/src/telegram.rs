use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::TelegramCredentials;
use crate::format::MAX_MESSAGE_LEN;
use crate::USER_AGENT;

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize, Debug)]
struct SendMessageResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Outcome of sending one digest, chunk by chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendReport {
    pub delivered: usize,
    pub failed: usize,
}

impl SendReport {
    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }

    /// True only if every chunk went through.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Split `text` into pieces of at most `max_len` characters.
///
/// The pieces partition the input exactly. A cut is made at the last newline
/// in the window when it lies in the second half of the window; otherwise the
/// window is hard-cut. Pieces after a newline cut start with that newline.
pub fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let window_end = match rest.char_indices().nth(max_len) {
            Some((byte_idx, _)) => byte_idx,
            None => {
                chunks.push(rest);
                break;
            }
        };

        let window = &rest[..window_end];
        let split_at = match window.rfind('\n') {
            Some(pos) if pos > 0 && window[..pos].chars().count() >= max_len / 2 => pos,
            _ => window_end,
        };

        let (chunk, remainder) = rest.split_at(split_at);
        chunks.push(chunk);
        rest = remainder;
    }

    chunks
}

pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    credentials: TelegramCredentials,
}

impl TelegramNotifier {
    pub fn new(base_url: impl Into<String>, credentials: TelegramCredentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Send `text`, split into as many messages as needed.
    pub async fn send(&self, text: &str) -> SendReport {
        let mut report = SendReport::default();

        let chunks: Vec<&str> = split_message(text, MAX_MESSAGE_LEN)
            .into_iter()
            .map(|c| c.trim_start_matches('\n'))
            .filter(|c| !c.is_empty())
            .collect();
        let total = chunks.len();

        for (index, chunk) in chunks.into_iter().enumerate() {
            match self.send_chunk(chunk).await {
                Ok(()) => {
                    info!(
                        chunk = index + 1,
                        total,
                        chars = chunk.chars().count(),
                        "Telegram chunk sent"
                    );
                    report.delivered += 1;
                }
                Err(e) => {
                    error!(
                        chunk = index + 1,
                        total,
                        error = %format!("{:#}", e),
                        "Telegram send failed"
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Best-effort notice that today's digest did not go out.
    pub async fn send_error_notice(&self, message: &str) {
        let text = format!("⚠️ Daily Digest Failed\n{}\nWill retry tomorrow.", message);
        let report = self.send(&text).await;
        if !report.is_success() {
            error!("Error notice could not be delivered either");
        }
    }

    async fn send_chunk(&self, chunk: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.credentials.bot_token);
        let request = SendMessageRequest {
            chat_id: &self.credentials.chat_id,
            text: chunk,
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Telegram")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Telegram response")?;

        let parsed: Option<SendMessageResponse> = serde_json::from_str(&body).ok();
        match parsed {
            Some(reply) if status.is_success() && reply.ok => Ok(()),
            Some(reply) => anyhow::bail!(
                "Telegram API error {}: {}",
                status.as_u16(),
                reply.description.unwrap_or(body)
            ),
            None => anyhow::bail!("Telegram returned {} with unreadable body", status.as_u16()),
        }
    }
}
