use serde_json::Value;

/// Read a number from a JSON value, defaulting to 0 when missing or not numeric.
fn number(value: &Value) -> f64 {
    value.as_f64().unwrap_or(0.0)
}

/// Read a string, defaulting to "?" when missing or not a string.
fn text(value: &Value) -> String {
    value.as_str().unwrap_or("?").to_string()
}

/// Global market snapshot from `/global`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalMarket {
    pub total_market_cap_usd: f64,
    pub market_cap_change_24h: f64,
    pub btc_dominance: f64,
    pub eth_dominance: f64,
    pub total_volume_usd: f64,
}

impl GlobalMarket {
    /// Parse the `data` object of a `/global` response.
    pub fn from_value(data: &Value) -> Self {
        Self {
            total_market_cap_usd: number(&data["total_market_cap"]["usd"]),
            market_cap_change_24h: number(&data["market_cap_change_percentage_24h_usd"]),
            btc_dominance: number(&data["market_cap_percentage"]["btc"]),
            eth_dominance: number(&data["market_cap_percentage"]["eth"]),
            total_volume_usd: number(&data["total_volume"]["usd"]),
        }
    }
}

/// One entry of `/search/trending`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendingCoin {
    pub name: String,
    pub symbol: String,
    pub market_cap_rank: Option<i64>,
    pub price_change_24h: f64,
}

impl TrendingCoin {
    /// Parse one element of the `coins` array (the coin lives under `item`).
    pub fn from_value(entry: &Value) -> Self {
        let item = &entry["item"];
        Self {
            name: text(&item["name"]),
            symbol: text(&item["symbol"]),
            market_cap_rank: item["market_cap_rank"].as_i64(),
            price_change_24h: number(&item["data"]["price_change_percentage_24h"]["usd"]),
        }
    }
}

/// One row of `/coins/markets`.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketCoin {
    pub name: String,
    pub symbol: String,
    pub current_price: f64,
    pub market_cap: f64,
    /// `None` when the provider omits or nulls the field; such coins are not movers.
    pub price_change_24h: Option<f64>,
}

impl MarketCoin {
    pub fn from_value(row: &Value) -> Self {
        Self {
            name: text(&row["name"]),
            symbol: text(&row["symbol"]).to_uppercase(),
            current_price: number(&row["current_price"]),
            market_cap: number(&row["market_cap"]),
            price_change_24h: row["price_change_percentage_24h"].as_f64(),
        }
    }
}

/// Everything fetched from the market-data provider in one run.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub global: Option<GlobalMarket>,
    pub trending: Option<Vec<TrendingCoin>>,
    pub top_coins: Option<Vec<MarketCoin>>,
}
