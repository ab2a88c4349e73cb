use std::env;

use crate::error::DigestError;

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
pub const DEFAULT_PERPLEXITY_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_TELEGRAM_URL: &str = "https://api.telegram.org";

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_PERPLEXITY_MODEL: &str = "sonar";

/// Base URLs for every provider the digest talks to.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub coingecko: String,
    pub anthropic: String,
    pub openai: String,
    pub perplexity: String,
    pub telegram: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            coingecko: DEFAULT_COINGECKO_URL.to_string(),
            anthropic: DEFAULT_ANTHROPIC_URL.to_string(),
            openai: DEFAULT_OPENAI_URL.to_string(),
            perplexity: DEFAULT_PERPLEXITY_URL.to_string(),
            telegram: DEFAULT_TELEGRAM_URL.to_string(),
        }
    }
}

/// An API key together with the model it should be used with.
#[derive(Debug, Clone)]
pub struct ModelCredentials {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub anthropic: Option<ModelCredentials>,
    pub openai: Option<ModelCredentials>,
    pub perplexity: Option<ModelCredentials>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub digest_topics: Option<String>,
    pub endpoints: Endpoints,
}

impl Config {
    pub fn from_env() -> Self {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let credentials = |key_var: &str, model_var: &str, default_model: &str| {
            get(key_var).map(|api_key| ModelCredentials {
                api_key,
                model: get(model_var).unwrap_or_else(|| default_model.to_string()),
            })
        };

        let endpoints = Endpoints {
            coingecko: get("DIGEST_COINGECKO_URL")
                .unwrap_or_else(|| DEFAULT_COINGECKO_URL.to_string()),
            anthropic: get("DIGEST_ANTHROPIC_URL")
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_URL.to_string()),
            openai: get("DIGEST_OPENAI_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
            perplexity: get("DIGEST_PERPLEXITY_URL")
                .unwrap_or_else(|| DEFAULT_PERPLEXITY_URL.to_string()),
            telegram: get("DIGEST_TELEGRAM_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_URL.to_string()),
        };

        Self {
            anthropic: credentials("ANTHROPIC_API_KEY", "ANTHROPIC_MODEL", DEFAULT_ANTHROPIC_MODEL),
            openai: credentials("OPENAI_API_KEY", "OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            perplexity: credentials(
                "PERPLEXITY_API_KEY",
                "PERPLEXITY_MODEL",
                DEFAULT_PERPLEXITY_MODEL,
            ),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN")
                .or_else(|| get("TAKOPI__TRANSPORTS__TELEGRAM__BOT_TOKEN")),
            telegram_chat_id: get("TELEGRAM_CHAT_ID")
                .or_else(|| get("TAKOPI__TRANSPORTS__TELEGRAM__CHAT_ID")),
            digest_topics: get("DIGEST_TOPICS"),
            endpoints,
        }
    }

    /// Telegram credentials are only required when actually sending.
    pub fn telegram(&self) -> Result<TelegramCredentials, DigestError> {
        let bot_token = self
            .telegram_bot_token
            .clone()
            .ok_or(DigestError::MissingCredential("TELEGRAM_BOT_TOKEN"))?;
        let chat_id = self
            .telegram_chat_id
            .clone()
            .ok_or(DigestError::MissingCredential("TELEGRAM_CHAT_ID"))?;

        Ok(TelegramCredentials { bot_token, chat_id })
    }

    pub fn has_ai_keys(&self) -> bool {
        self.anthropic.is_some() || self.openai.is_some() || self.perplexity.is_some()
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/daily-digest/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("daily-digest").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }

        // If none found, that's okay - environment variables might be set system-wide
    }
}
