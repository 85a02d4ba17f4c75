//! In-memory market data providers
//!
//! Provides canned implementations of the provider traits for:
//! - Unit tests without network calls
//! - Pipeline tests that need deterministic market data

use super::{
    CoinDetail, CoinListing, CoinMarket, CryptoMarketData, EquityQuote, EquityQuoteSource,
    LiveQuote, LiveQuoteSource,
};
use crate::error::{BotError, Result};
use crate::types::{Session, SessionQuote};
use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Canned CoinGecko data
#[derive(Default)]
pub struct MockCryptoMarket {
    listings: Vec<CoinListing>,
    details: HashMap<String, CoinDetail>,
    failing: HashSet<String>,
    detail_calls: AtomicUsize,
    requested: RwLock<Vec<String>>,
}

impl MockCryptoMarket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listed coin with its market data
    pub fn with_coin(mut self, listing: CoinListing, detail: CoinDetail) -> Self {
        self.details.insert(listing.id.clone(), detail);
        self.listings.push(listing);
        self
    }

    /// Add a listed coin whose detail lookup fails
    pub fn with_failing_coin(mut self, listing: CoinListing) -> Self {
        self.failing.insert(listing.id.clone());
        self.listings.push(listing);
        self
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    /// Ids passed to `coin_detail`, in call order
    pub fn requested(&self) -> Vec<String> {
        self.requested.read().clone()
    }
}

#[async_trait]
impl CryptoMarketData for MockCryptoMarket {
    async fn coin_list(&self) -> Result<Vec<CoinListing>> {
        Ok(self.listings.clone())
    }

    async fn coin_detail(&self, id: &str) -> Result<CoinDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.requested.write().push(id.to_string());

        if self.failing.contains(id) {
            return Err(BotError::CollaboratorUnavailable(format!("mock: {} failed", id)));
        }
        self.details
            .get(id)
            .cloned()
            .ok_or_else(|| BotError::Api(format!("mock: unknown coin {}", id)))
    }
}

/// Canned TradingView quotes keyed by uppercase ticker
#[derive(Default)]
pub struct MockLiveQuotes {
    quotes: HashMap<String, LiveQuote>,
    calls: AtomicUsize,
    unavailable: bool,
}

impl MockLiveQuotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, ticker: &str, quote: LiveQuote) -> Self {
        self.quotes.insert(ticker.to_uppercase(), quote);
        self
    }

    /// Every call fails as if the provider were down
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LiveQuoteSource for MockLiveQuotes {
    async fn live_quote(&self, ticker: &str) -> Result<Option<LiveQuote>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(BotError::CollaboratorUnavailable("mock: tradingview down".into()));
        }
        Ok(self.quotes.get(&ticker.to_uppercase()).cloned())
    }
}

/// Canned Yahoo quotes keyed by uppercase ticker
#[derive(Default)]
pub struct MockEquityQuotes {
    quotes: HashMap<String, EquityQuote>,
    calls: AtomicUsize,
}

impl MockEquityQuotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, ticker: &str, quote: EquityQuote) -> Self {
        self.quotes.insert(ticker.to_uppercase(), quote);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EquityQuoteSource for MockEquityQuotes {
    async fn equity_quote(&self, ticker: &str) -> Result<Option<EquityQuote>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.quotes.get(&ticker.to_uppercase()).cloned())
    }
}

pub fn listing(id: &str, symbol: &str, name: &str) -> CoinListing {
    CoinListing {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
    }
}

/// Coin detail with one market per `(base, exchange)` pair
pub fn coin_detail(
    id: &str,
    volume_usd: Decimal,
    price_usd: Decimal,
    change_24h: Option<Decimal>,
    markets: &[(&str, &str)],
) -> CoinDetail {
    CoinDetail {
        id: id.to_string(),
        volume_usd,
        price_usd: Some(price_usd),
        change_24h,
        markets: markets
            .iter()
            .map(|(base, exchange)| CoinMarket {
                base: base.to_string(),
                exchange: exchange.to_string(),
            })
            .collect(),
    }
}

pub fn live_quote(symbol: &str, exchange: &str, price: Decimal, volume: Decimal) -> LiveQuote {
    LiveQuote {
        symbol: symbol.to_string(),
        exchange: exchange.to_string(),
        price,
        change_pct: Some(Decimal::ONE),
        volume,
        rating: Some("Buy".to_string()),
        source_url: format!("https://www.tradingview.com/symbols/{}-{}/", exchange, symbol),
    }
}

/// Regular-session equity quote
pub fn equity_quote(symbol: &str, price: Decimal, change: Decimal, volume: Decimal) -> EquityQuote {
    EquityQuote {
        symbol: symbol.to_string(),
        exchange: Some("NasdaqGS".to_string()),
        volume,
        sessions: vec![SessionQuote {
            session: Session::Regular,
            price,
            change_pct: Some(change),
        }],
        source_url: format!("https://finance.yahoo.com/quote/{}", symbol),
    }
}
