use chrono::{DateTime, Utc};

use crate::models::{GlobalMarket, MarketCoin, MarketSnapshot, TrendingCoin};

const MAX_LISTED: usize = 10;

/// Plain-text document handed to the summarizer.
///
/// Each section is independently optional; a failed fetch becomes an
/// "unavailable" line rather than a missing section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBriefing {
    pub sections: Vec<String>,
}

impl RawBriefing {
    pub fn render(&self) -> String {
        self.sections.join("\n")
    }
}

pub struct BriefingAssembler;

impl BriefingAssembler {
    pub fn assemble(
        snapshot: &MarketSnapshot,
        topics: Option<&str>,
        now: DateTime<Utc>,
    ) -> RawBriefing {
        let mut sections = vec![format!(
            "Data collected at: {}\n",
            now.format("%Y-%m-%d %H:%M UTC")
        )];

        sections.push(Self::global_section(snapshot.global.as_ref()));
        sections.push(Self::trending_section(snapshot.trending.as_deref()));

        match snapshot.top_coins.as_deref() {
            Some(coins) if !coins.is_empty() => {
                sections.push(Self::top_coins_section(coins));
                if let Some(movers) = Self::movers_section(coins) {
                    sections.push(movers);
                }
            }
            _ => sections.push("TOP COINS: unavailable\n".to_string()),
        }

        if let Some(topics) = topics.map(str::trim).filter(|t| !t.is_empty()) {
            sections.push(format!("USER WATCHLIST TOPICS: {}\n", topics));
        }

        RawBriefing { sections }
    }

    fn global_section(global: Option<&GlobalMarket>) -> String {
        let Some(g) = global else {
            return "GLOBAL MARKET DATA: unavailable\n".to_string();
        };

        format!(
            "GLOBAL MARKET DATA:\n\
             - Total Market Cap: ${}B ({} 24h)\n\
             - BTC Dominance: {:.1}%\n\
             - ETH Dominance: {:.1}%\n\
             - 24h Volume: ${}B\n",
            with_commas(g.total_market_cap_usd / 1e9, 1),
            signed_percent(g.market_cap_change_24h),
            g.btc_dominance,
            g.eth_dominance,
            with_commas(g.total_volume_usd / 1e9, 1),
        )
    }

    fn trending_section(trending: Option<&[TrendingCoin]>) -> String {
        let coins = match trending {
            Some(coins) if !coins.is_empty() => coins,
            _ => return "TRENDING COINS: unavailable\n".to_string(),
        };

        let mut section = String::from("TRENDING COINS ON COINGECKO:\n");
        for (i, coin) in coins.iter().take(MAX_LISTED).enumerate() {
            let rank = coin
                .market_cap_rank
                .map(|r| r.to_string())
                .unwrap_or_else(|| "?".to_string());
            section.push_str(&format!(
                "  {}. {} ({}) — Rank #{} — 24h: {}\n",
                i + 1,
                coin.name,
                coin.symbol,
                rank,
                signed_percent(coin.price_change_24h)
            ));
        }
        section
    }

    fn top_coins_section(coins: &[MarketCoin]) -> String {
        let mut section = String::from("TOP 10 BY MARKET CAP:\n");
        for coin in coins.iter().take(MAX_LISTED) {
            section.push_str(&format!(
                "  {} ({}): ${} | 24h: {} | MCap: ${}B\n",
                coin.name,
                coin.symbol,
                with_commas(coin.current_price, 2),
                signed_percent(coin.price_change_24h.unwrap_or(0.0)),
                with_commas(coin.market_cap / 1e9, 1),
            ));
        }
        section
    }

    fn movers_section(coins: &[MarketCoin]) -> Option<String> {
        let (gainer, loser) = Self::top_movers(coins)?;
        Some(format!(
            "BIGGEST MOVERS (top 20):\n{}\n{}\n",
            Self::mover_line("🟢 Top gainer", gainer),
            Self::mover_line("🔴 Top loser", loser),
        ))
    }

    fn mover_line(label: &str, coin: &MarketCoin) -> String {
        format!(
            "  {}: {} ({}) {}",
            label,
            coin.name,
            coin.symbol,
            signed_percent(coin.price_change_24h.unwrap_or(0.0))
        )
    }

    /// Largest and smallest 24h change among coins that report one.
    ///
    /// Ties keep the earliest coin as gainer and the latest coin as loser.
    pub fn top_movers(coins: &[MarketCoin]) -> Option<(&MarketCoin, &MarketCoin)> {
        let mut with_change = coins
            .iter()
            .filter_map(|c| c.price_change_24h.filter(|v| v.is_finite()).map(|v| (c, v)));

        let (first, first_change) = with_change.next()?;
        let (mut gainer, mut max) = (first, first_change);
        let (mut loser, mut min) = (first, first_change);

        for (coin, change) in with_change {
            if change > max {
                gainer = coin;
                max = change;
            }
            if change <= min {
                loser = coin;
                min = change;
            }
        }

        Some((gainer, loser))
    }
}

/// `+1.2%` / `-3.4%`
pub fn signed_percent(value: f64) -> String {
    format!("{:+.1}%", value)
}

/// Format with a fixed number of decimals and comma thousands separators.
pub fn with_commas(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}
