//! Lookup strategies of the resolver chain

use super::assets::SharedAssets;
use super::{clean_exchanges, ResolveStrategy};
use crate::client::{
    CoinDetail, CryptoMarketData, EquityQuote, EquityQuoteSource, LiveQuote, LiveQuoteSource,
};
use crate::error::Result;
use crate::types::{MarketData, Session, SessionQuote, SourceKind, SymbolSnapshot};
use async_trait::async_trait;
use std::sync::Arc;

/// Longest base symbol accepted from a market listing
const MAX_BASE_LEN: usize = 7;

pub fn coingecko_url(id: &str) -> String {
    format!("https://coingecko.com/en/coins/{}", id)
}

/// First usable market base, skipping contract addresses and long names
fn base_symbol(detail: &CoinDetail) -> Option<String> {
    detail
        .markets
        .iter()
        .map(|m| m.base.to_uppercase())
        .find(|base| !base.starts_with("0X") && base.len() <= MAX_BASE_LEN)
}

pub fn coin_snapshot(ticker: &str, detail: CoinDetail) -> SymbolSnapshot {
    let symbol = match base_symbol(&detail) {
        Some(base) => base,
        None => {
            if !detail.volume_usd.is_zero() {
                tracing::warn!("No base symbol found for {} ({}), using ticker", ticker, detail.id);
            }
            ticker.to_string()
        }
    };

    let quotes = detail
        .price_usd
        .map(|price| SessionQuote {
            session: Session::Regular,
            price,
            change_pct: detail.change_24h.map(|c| c.round_dp(2)),
        })
        .into_iter()
        .collect();

    let market = MarketData {
        volume: detail.volume_usd,
        quotes,
        exchanges: clean_exchanges(detail.markets.iter().map(|m| m.exchange.as_str())),
        source_url: coingecko_url(&detail.id),
        technical_indicator: None,
    };
    SymbolSnapshot::resolved(symbol, SourceKind::Crypto, market)
}

fn live_snapshot(ticker: &str, quote: LiveQuote) -> SymbolSnapshot {
    let market = MarketData {
        volume: quote.volume,
        quotes: vec![SessionQuote {
            session: Session::Regular,
            price: quote.price,
            change_pct: quote.change_pct,
        }],
        exchanges: clean_exchanges(std::iter::once(quote.exchange.as_str())),
        source_url: quote.source_url,
        technical_indicator: quote.rating,
    };
    SymbolSnapshot::resolved(ticker, SourceKind::Crypto, market)
}

fn equity_snapshot(quote: EquityQuote) -> SymbolSnapshot {
    let market = MarketData {
        volume: quote.volume,
        quotes: quote.sessions,
        exchanges: clean_exchanges(quote.exchange.as_deref()),
        source_url: quote.source_url,
        technical_indicator: None,
    };
    SymbolSnapshot::resolved(quote.symbol, SourceKind::Equity, market)
}

async fn detail_snapshot(
    market: &dyn CryptoMarketData,
    ticker: &str,
    id: &str,
) -> Result<Option<SymbolSnapshot>> {
    let detail = market.coin_detail(id).await?;
    Ok(Some(coin_snapshot(ticker, detail)))
}

/// Exact symbol match in the asset table. Ambiguous symbols query every
/// candidate and keep the one with the highest USD volume.
pub struct CoinGeckoSymbol {
    market: Arc<dyn CryptoMarketData>,
    assets: SharedAssets,
}

impl CoinGeckoSymbol {
    pub fn new(market: Arc<dyn CryptoMarketData>, assets: SharedAssets) -> Self {
        Self { market, assets }
    }
}

#[async_trait]
impl ResolveStrategy for CoinGeckoSymbol {
    fn name(&self) -> &'static str {
        "coingecko_symbol"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Crypto
    }

    async fn lookup(&self, ticker: &str) -> Result<Option<SymbolSnapshot>> {
        let ids = self.assets.read().ids_for_symbol(ticker);
        if ids.len() > 1 {
            tracing::debug!("{} matches {} coins, picking by volume", ticker, ids.len());
        }

        let mut best: Option<CoinDetail> = None;
        for id in &ids {
            match self.market.coin_detail(id).await {
                Ok(detail) => {
                    if best.as_ref().map_or(true, |b| detail.volume_usd > b.volume_usd) {
                        best = Some(detail);
                    }
                }
                Err(e) => tracing::warn!("Skipping candidate {} for {}: {}", id, ticker, e),
            }
        }

        Ok(best.map(|detail| coin_snapshot(ticker, detail)))
    }
}

/// Live quote source queried by raw ticker
pub struct TradingViewQuote {
    source: Arc<dyn LiveQuoteSource>,
}

impl TradingViewQuote {
    pub fn new(source: Arc<dyn LiveQuoteSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl ResolveStrategy for TradingViewQuote {
    fn name(&self) -> &'static str {
        "tradingview"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Crypto
    }

    async fn lookup(&self, ticker: &str) -> Result<Option<SymbolSnapshot>> {
        let quote = self.source.live_quote(ticker).await?;
        Ok(quote.map(|q| live_snapshot(ticker, q)))
    }
}

/// Asset table lookup by lower-cased coin id
pub struct CoinGeckoId {
    market: Arc<dyn CryptoMarketData>,
    assets: SharedAssets,
}

impl CoinGeckoId {
    pub fn new(market: Arc<dyn CryptoMarketData>, assets: SharedAssets) -> Self {
        Self { market, assets }
    }
}

#[async_trait]
impl ResolveStrategy for CoinGeckoId {
    fn name(&self) -> &'static str {
        "coingecko_id"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Crypto
    }

    async fn lookup(&self, ticker: &str) -> Result<Option<SymbolSnapshot>> {
        let id = ticker.to_lowercase();
        if !self.assets.read().contains_id(&id) {
            return Ok(None);
        }
        detail_snapshot(self.market.as_ref(), ticker, &id).await
    }
}

/// Asset table lookup by exact display name
pub struct CoinGeckoName {
    market: Arc<dyn CryptoMarketData>,
    assets: SharedAssets,
}

impl CoinGeckoName {
    pub fn new(market: Arc<dyn CryptoMarketData>, assets: SharedAssets) -> Self {
        Self { market, assets }
    }
}

#[async_trait]
impl ResolveStrategy for CoinGeckoName {
    fn name(&self) -> &'static str {
        "coingecko_name"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Crypto
    }

    async fn lookup(&self, ticker: &str) -> Result<Option<SymbolSnapshot>> {
        let id = self.assets.read().id_for_name(ticker).map(str::to_string);
        match id {
            Some(id) => detail_snapshot(self.market.as_ref(), ticker, &id).await,
            None => Ok(None),
        }
    }
}

pub struct YahooEquity {
    source: Arc<dyn EquityQuoteSource>,
}

impl YahooEquity {
    pub fn new(source: Arc<dyn EquityQuoteSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl ResolveStrategy for YahooEquity {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Equity
    }

    async fn lookup(&self, ticker: &str) -> Result<Option<SymbolSnapshot>> {
        let quote = self.source.equity_quote(ticker).await?;
        Ok(quote.map(equity_snapshot))
    }
}
