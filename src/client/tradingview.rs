//! TradingView scanner client
//!
//! Live crypto quotes by base currency, highest-volume pair first, with the
//! 4h "Recommend.All" technical rating.

use super::{check_status, decimal, unavailable, LiveQuote, LiveQuoteSource};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const PROVIDER: &str = "tradingview";

const COLUMNS: [&str; 6] = ["name", "exchange", "close", "change", "volume", "Recommend.All|240"];

pub struct TradingViewClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ScanResponse {
    #[serde(default)]
    data: Vec<ScanRow>,
}

#[derive(Debug, Deserialize)]
struct ScanRow {
    /// `EXCHANGE:PAIR`
    s: String,
    d: Vec<Value>,
}

impl TradingViewClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn scan_body(ticker: &str) -> Value {
        json!({
            "filter": [
                { "left": "base_currency", "operation": "equal", "right": ticker.to_uppercase() }
            ],
            "columns": COLUMNS,
            "sort": { "sortBy": "volume", "sortOrder": "desc" },
            "range": [0, 1]
        })
    }
}

fn number(row: &ScanRow, column: usize) -> Option<Decimal> {
    row.d.get(column).and_then(Value::as_f64).and_then(decimal)
}

fn text(row: &ScanRow, column: usize) -> Option<String> {
    row.d.get(column).and_then(Value::as_str).map(str::to_string)
}

/// Rating label for a `Recommend.All` value in [-1, 1]
pub fn rating_label(value: f64) -> &'static str {
    if value <= -0.5 {
        "Strong Sell"
    } else if value < -0.1 {
        "Sell"
    } else if value <= 0.1 {
        "Neutral"
    } else if value < 0.5 {
        "Buy"
    } else {
        "Strong Buy"
    }
}

/// First row of a scan response as a quote
pub fn parse_scan(body: Value) -> Result<Option<LiveQuote>> {
    let response: ScanResponse = serde_json::from_value(body)?;
    let Some(row) = response.data.into_iter().next() else {
        return Ok(None);
    };

    let Some(price) = number(&row, 2) else {
        return Ok(None);
    };
    let base_volume = number(&row, 4).unwrap_or(Decimal::ZERO);
    let exchange = text(&row, 1)
        .or_else(|| row.s.split(':').next().map(str::to_string))
        .unwrap_or_default();

    Ok(Some(LiveQuote {
        symbol: text(&row, 0).unwrap_or_else(|| row.s.clone()),
        exchange,
        price,
        change_pct: number(&row, 3).map(|c| c.round_dp(2)),
        volume: (base_volume * price).round_dp(2),
        rating: row
            .d
            .get(5)
            .and_then(Value::as_f64)
            .map(|v| rating_label(v).to_string()),
        source_url: format!("https://www.tradingview.com/symbols/{}/", row.s.replace(':', "-")),
    }))
}

#[async_trait]
impl LiveQuoteSource for TradingViewClient {
    async fn live_quote(&self, ticker: &str) -> Result<Option<LiveQuote>> {
        let url = format!("{}/crypto/scan", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&Self::scan_body(ticker))
            .send()
            .await
            .map_err(|e| unavailable(PROVIDER, e))?;
        check_status(PROVIDER, &resp)?;

        let body: Value = resp.json().await?;
        parse_scan(body)
    }
}
