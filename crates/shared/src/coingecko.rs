use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{GlobalMarket, MarketCoin, MarketSnapshot, TrendingCoin};
use crate::USER_AGENT;

const TOP_COINS_QUERY: &str =
    "vs_currency=usd&order=market_cap_desc&per_page=20&sparkline=false&price_change_percentage=24h";

/// Read-only client for the public CoinGecko endpoints.
///
/// Every fetch returns `None` on failure; the caller renders an
/// "unavailable" section instead of aborting the run.
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the three market endpoints one after another.
    pub async fn fetch_snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            global: self.fetch_global().await,
            trending: self.fetch_trending().await,
            top_coins: self.fetch_top_coins().await,
        }
    }

    pub async fn fetch_global(&self) -> Option<GlobalMarket> {
        let body = self.get_json("global").await?;
        let data = body
            .get("data")
            .filter(|d| d.as_object().is_some_and(|o| !o.is_empty()))?;
        Some(GlobalMarket::from_value(data))
    }

    pub async fn fetch_trending(&self) -> Option<Vec<TrendingCoin>> {
        let body = self.get_json("search/trending").await?;
        let coins = body.get("coins")?.as_array()?;
        Some(coins.iter().map(TrendingCoin::from_value).collect())
    }

    /// Top 20 coins by market cap, with 24h change.
    pub async fn fetch_top_coins(&self) -> Option<Vec<MarketCoin>> {
        let body = self
            .get_json(&format!("coins/markets?{}", TOP_COINS_QUERY))
            .await?;
        let rows = body.as_array()?;
        Some(rows.iter().map(MarketCoin::from_value).collect())
    }

    async fn get_json(&self, path: &str) -> Option<Value> {
        let url = format!("{}/{}", self.base_url, path);
        match self.try_get_json(&url).await {
            Ok(value) => {
                debug!(url = %url, "CoinGecko request succeeded");
                Some(value)
            }
            Err(e) => {
                warn!(url = %url, error = %format!("{:#}", e), "HTTP GET failed");
                None
            }
        }
    }

    async fn try_get_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("CoinGecko returned {}", status);
        }

        response
            .json::<Value>()
            .await
            .context("Failed to parse CoinGecko response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_global_unwraps_data() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/global");
                then.status(200).json_body(json!({
                    "data": {
                        "total_market_cap": { "usd": 3.0e12 },
                        "market_cap_change_percentage_24h_usd": -1.5,
                        "market_cap_percentage": { "btc": 55.1, "eth": 12.3 },
                        "total_volume": { "usd": 9.0e10 }
                    }
                }));
            })
            .await;

        let client = CoinGeckoClient::new(server.base_url()).unwrap();
        let global = client.fetch_global().await.unwrap();

        assert_eq!(global.market_cap_change_24h, -1.5);
        assert_eq!(global.btc_dominance, 55.1);
    }

    #[tokio::test]
    async fn test_fetch_global_missing_data_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/global");
                then.status(200).json_body(json!({ "status": "ok" }));
            })
            .await;

        let client = CoinGeckoClient::new(server.base_url()).unwrap();
        assert!(client.fetch_global().await.is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search/trending");
                then.status(429).body("rate limited");
            })
            .await;

        let client = CoinGeckoClient::new(server.base_url()).unwrap();
        assert!(client.fetch_trending().await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/coins/markets");
                then.status(200).body("<html>not json</html>");
            })
            .await;

        let client = CoinGeckoClient::new(server.base_url()).unwrap();
        assert!(client.fetch_top_coins().await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_top_coins_sends_market_query() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/coins/markets")
                    .query_param("vs_currency", "usd")
                    .query_param("per_page", "20");
                then.status(200).json_body(json!([
                    { "name": "Bitcoin", "symbol": "btc", "current_price": 65000.0,
                      "market_cap": 1.3e12, "price_change_percentage_24h": 2.0 }
                ]));
            })
            .await;

        let client = CoinGeckoClient::new(server.base_url()).unwrap();
        let coins = client.fetch_top_coins().await.unwrap();

        mock.assert_async().await;
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].symbol, "BTC");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_none() {
        // Port 9 (discard) on localhost is not expected to be listening
        let client = CoinGeckoClient::new("http://127.0.0.1:9").unwrap();
        assert!(client.fetch_global().await.is_none());
    }
}
