// Public modules
pub mod briefing;
pub mod coingecko;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod summarizer;
pub mod telegram;

/// Sent with every outbound request.
pub const USER_AGENT: &str = concat!("daily-digest/", env!("CARGO_PKG_VERSION"));

// Re-export commonly used types
pub use briefing::{BriefingAssembler, RawBriefing};
pub use coingecko::CoinGeckoClient;
pub use config::Config;
pub use error::DigestError;
pub use models::{GlobalMarket, MarketCoin, MarketSnapshot, TrendingCoin};
pub use pipeline::{RunOptions, RunOutcome};
pub use summarizer::{Summary, SummaryChain, Variant};
pub use telegram::{SendReport, TelegramNotifier};
