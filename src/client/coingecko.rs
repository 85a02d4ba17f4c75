//! CoinGecko API client
//!
//! Fetches the coin list for the local asset table and per-coin market data.

use super::{check_status, decimal, unavailable, CoinDetail, CoinListing, CoinMarket, CryptoMarketData};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "coingecko";

pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CoinResponse {
    id: String,
    #[serde(default)]
    market_data: Option<MarketDataResponse>,
    #[serde(default)]
    tickers: Vec<TickerResponse>,
}

#[derive(Debug, Deserialize)]
struct MarketDataResponse {
    #[serde(default)]
    current_price: UsdValue,
    #[serde(default)]
    total_volume: UsdValue,
    price_change_percentage_24h: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct UsdValue {
    usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    base: String,
    market: TickerMarket,
}

#[derive(Debug, Deserialize)]
struct TickerMarket {
    name: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn into_detail(resp: CoinResponse) -> CoinDetail {
        let (volume_usd, price_usd, change_24h) = match resp.market_data {
            Some(md) => (
                md.total_volume.usd.and_then(decimal).unwrap_or(Decimal::ZERO),
                md.current_price.usd.and_then(decimal),
                md.price_change_percentage_24h.and_then(decimal),
            ),
            None => (Decimal::ZERO, None, None),
        };

        CoinDetail {
            id: resp.id,
            volume_usd,
            price_usd,
            change_24h,
            markets: resp
                .tickers
                .into_iter()
                .map(|t| CoinMarket {
                    base: t.base,
                    exchange: t.market.name,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl CryptoMarketData for CoinGeckoClient {
    async fn coin_list(&self) -> Result<Vec<CoinListing>> {
        let url = format!("{}/coins/list", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(PROVIDER, e))?;
        check_status(PROVIDER, &resp)?;

        let coins: Vec<CoinListing> = resp.json().await?;
        tracing::info!("Loaded {} coins from CoinGecko", coins.len());
        Ok(coins)
    }

    async fn coin_detail(&self, id: &str) -> Result<CoinDetail> {
        let url = format!("{}/coins/{}", self.base_url, id);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("localization", "false"),
                ("tickers", "true"),
                ("market_data", "true"),
                ("community_data", "false"),
                ("developer_data", "false"),
                ("sparkline", "false"),
            ])
            .send()
            .await
            .map_err(|e| unavailable(PROVIDER, e))?;
        check_status(PROVIDER, &resp)?;

        let coin: CoinResponse = resp.json().await?;
        Ok(Self::into_detail(coin))
    }
}

/// Parse a `/coins/{id}` body
pub fn parse_coin_detail(body: serde_json::Value) -> Result<CoinDetail> {
    let coin: CoinResponse = serde_json::from_value(body)?;
    Ok(CoinGeckoClient::into_detail(coin))
}
