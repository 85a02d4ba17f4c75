//! Yahoo Finance quote client

use super::{check_status, decimal, unavailable, EquityQuote, EquityQuoteSource};
use crate::error::Result;
use crate::types::{Session, SessionQuote};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "yahoo";

/// Quote types treated as equities
const EQUITY_TYPES: [&str; 2] = ["EQUITY", "ETF"];

pub struct YahooClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    symbol: String,
    quote_type: Option<String>,
    market_state: Option<String>,
    full_exchange_name: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_change_percent: Option<f64>,
    regular_market_volume: Option<f64>,
    post_market_price: Option<f64>,
    post_market_change_percent: Option<f64>,
    pre_market_price: Option<f64>,
    pre_market_change_percent: Option<f64>,
}

impl YahooClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("Mozilla/5.0")
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

fn session(session: Session, price: Option<f64>, change: Option<f64>) -> Option<SessionQuote> {
    Some(SessionQuote {
        session,
        price: price.and_then(decimal)?.round_dp(2),
        change_pct: change.and_then(decimal).map(|c| c.round_dp(2)),
    })
}

fn into_quote(q: YahooQuote) -> Option<EquityQuote> {
    let is_equity = q
        .quote_type
        .as_deref()
        .is_some_and(|t| EQUITY_TYPES.contains(&t));
    if !is_equity {
        return None;
    }

    let regular = session(Session::Regular, q.regular_market_price, q.regular_market_change_percent)?;
    let state = q.market_state.as_deref().unwrap_or("REGULAR");

    let mut sessions = Vec::with_capacity(2);
    if state.starts_with("PRE") {
        sessions.extend(session(Session::PreMarket, q.pre_market_price, q.pre_market_change_percent));
    } else if state != "REGULAR" {
        sessions.extend(session(Session::AfterHours, q.post_market_price, q.post_market_change_percent));
    }

    let shares = q.regular_market_volume.and_then(decimal).unwrap_or(Decimal::ZERO);
    let volume = (shares * regular.price).round_dp(2);
    sessions.push(regular);

    Some(EquityQuote {
        source_url: format!("https://finance.yahoo.com/quote/{}", q.symbol),
        symbol: q.symbol,
        exchange: q.full_exchange_name,
        volume,
        sessions,
    })
}

/// First equity quote of a `/v7/finance/quote` body
pub fn parse_quote(body: serde_json::Value) -> Result<Option<EquityQuote>> {
    let envelope: QuoteEnvelope = serde_json::from_value(body)?;
    Ok(envelope.quote_response.result.into_iter().find_map(into_quote))
}

#[async_trait]
impl EquityQuoteSource for YahooClient {
    async fn equity_quote(&self, ticker: &str) -> Result<Option<EquityQuote>> {
        let url = format!("{}/v7/finance/quote", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("symbols", ticker)])
            .send()
            .await
            .map_err(|e| unavailable(PROVIDER, e))?;
        check_status(PROVIDER, &resp)?;

        let body: serde_json::Value = resp.json().await?;
        parse_quote(body)
    }
}
