use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::Config;
use crate::providers::{
    truncate_chars, AnthropicProvider, OpenAiProvider, PerplexityProvider, SummaryProvider,
};

/// Characters of raw data kept when no AI provider produced a summary.
pub const NO_AI_CHAR_LIMIT: usize = 3500;

#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    Generated { provider: &'static str, text: String },
    /// Deterministic local formatting of the raw briefing.
    Fallback(String),
}

impl Summary {
    pub fn text(&self) -> &str {
        match self {
            Summary::Generated { text, .. } => text,
            Summary::Fallback(text) => text,
        }
    }

    pub fn provider(&self) -> Option<&'static str> {
        match self {
            Summary::Generated { provider, .. } => Some(*provider),
            Summary::Fallback(_) => None,
        }
    }
}

/// Which provider line-up a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Summarize fetched market data: Claude, then OpenAI.
    #[default]
    Market,
    /// Ask a search-augmented model for today's news first, then fall back
    /// to the market line-up.
    News,
}

/// Ordered list of providers, tried until one returns text.
pub struct SummaryChain {
    providers: Vec<Box<dyn SummaryProvider>>,
}

impl SummaryChain {
    pub fn new(providers: Vec<Box<dyn SummaryProvider>>) -> Self {
        Self { providers }
    }

    /// Build the chain from whichever API keys are configured.
    pub fn from_config(config: &Config, variant: Variant) -> Result<Self> {
        let mut providers: Vec<Box<dyn SummaryProvider>> = Vec::new();

        if variant == Variant::News {
            if let Some(credentials) = &config.perplexity {
                providers.push(Box::new(PerplexityProvider::new(
                    config.endpoints.perplexity.clone(),
                    credentials.clone(),
                    config.digest_topics.clone(),
                )?));
            } else {
                warn!("News variant selected but PERPLEXITY_API_KEY is not set");
            }
        }

        if let Some(credentials) = &config.anthropic {
            providers.push(Box::new(AnthropicProvider::new(
                config.endpoints.anthropic.clone(),
                credentials.clone(),
            )?));
        }

        if let Some(credentials) = &config.openai {
            providers.push(Box::new(OpenAiProvider::new(
                config.endpoints.openai.clone(),
                credentials.clone(),
            )?));
        }

        Ok(Self::new(providers))
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn summarize(&self, raw: &str, now: DateTime<Utc>) -> Summary {
        for provider in &self.providers {
            info!(provider = provider.name(), "Attempting summarization");
            if let Some(text) = provider.summarize(raw).await {
                return Summary::Generated {
                    provider: provider.name(),
                    text,
                };
            }
        }

        if self.providers.is_empty() {
            warn!("No AI API keys set, using raw format");
        } else {
            warn!("All AI summarization failed, using raw format");
        }
        Summary::Fallback(format_no_ai(raw, now))
    }
}

/// Non-AI output: a title line plus the raw data cut at [`NO_AI_CHAR_LIMIT`].
///
/// This is a plain truncation, not a summary.
pub fn format_no_ai(raw: &str, now: DateTime<Utc>) -> String {
    format!(
        "📰 Raw Crypto Briefing — {}\n\n{}",
        now.format("%Y-%m-%d"),
        truncate_chars(raw, NO_AI_CHAR_LIMIT)
    )
}
