//! Market data clients
//!
//! This module provides interfaces to the third-party data providers:
//! - CoinGecko: coin list and per-coin market data
//! - TradingView scanner: live crypto quotes with a 4h technical rating
//! - Yahoo Finance: equity quotes including extended-hours sessions

pub mod coingecko;
pub mod mock;
pub mod throttle;
pub mod tradingview;
pub mod yahoo;


pub use coingecko::CoinGeckoClient;
pub use throttle::{CallBudget, Throttled};
pub use tradingview::TradingViewClient;
pub use yahoo::YahooClient;

use crate::error::{BotError, Result};
use crate::types::SessionQuote;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One entry of the CoinGecko coin list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinListing {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

/// Market of a coin on one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinMarket {
    pub base: String,
    pub exchange: String,
}

/// Market details of one coin
#[derive(Debug, Clone, PartialEq)]
pub struct CoinDetail {
    pub id: String,
    pub volume_usd: Decimal,
    pub price_usd: Option<Decimal>,
    pub change_24h: Option<Decimal>,
    pub markets: Vec<CoinMarket>,
}

/// Live quote from the secondary source
#[derive(Debug, Clone, PartialEq)]
pub struct LiveQuote {
    pub symbol: String,
    pub exchange: String,
    pub price: Decimal,
    pub change_pct: Option<Decimal>,
    /// Quote-currency volume
    pub volume: Decimal,
    pub rating: Option<String>,
    pub source_url: String,
}

/// Equity quote, extended-hours sessions first
#[derive(Debug, Clone, PartialEq)]
pub struct EquityQuote {
    pub symbol: String,
    pub exchange: Option<String>,
    pub volume: Decimal,
    pub sessions: Vec<SessionQuote>,
    pub source_url: String,
}

/// Primary crypto data provider
#[async_trait]
pub trait CryptoMarketData: Send + Sync {
    async fn coin_list(&self) -> Result<Vec<CoinListing>>;

    async fn coin_detail(&self, id: &str) -> Result<CoinDetail>;
}

/// Secondary crypto quote provider, queried by raw ticker
#[async_trait]
pub trait LiveQuoteSource: Send + Sync {
    async fn live_quote(&self, ticker: &str) -> Result<Option<LiveQuote>>;
}

#[async_trait]
pub trait EquityQuoteSource: Send + Sync {
    async fn equity_quote(&self, ticker: &str) -> Result<Option<EquityQuote>>;
}

/// Transport failures of a provider
pub(crate) fn unavailable(provider: &str, err: reqwest::Error) -> BotError {
    BotError::CollaboratorUnavailable(format!("{}: {}", provider, err))
}

/// Map a non-success status to the matching error
pub(crate) fn check_status(provider: &str, resp: &reqwest::Response) -> Result<()> {
    let status = resp.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        return Err(BotError::RateLimited { retry_after_secs });
    }
    if !status.is_success() {
        return Err(BotError::Api(format!("{} returned {}", provider, status)));
    }
    Ok(())
}

/// Decimal from a JSON float, `None` for NaN or infinities
pub(crate) fn decimal(value: f64) -> Option<Decimal> {
    Decimal::try_from(value).ok()
}
