//! Symbol resolution
//!
//! Maps a raw ticker to a [`SymbolSnapshot`] by walking an ordered chain of
//! lookup strategies. The first "good enough" result wins; otherwise the
//! partial result with the highest volume is kept, and a ticker nobody
//! trades is reported as unresolved. Resolution never fails.

pub mod assets;
pub mod strategies;

#[cfg(test)]
mod tests;

pub use assets::{AssetTable, SharedAssets};

use crate::client::{CryptoMarketData, EquityQuoteSource, LiveQuoteSource};
use crate::config::MarketDataConfig;
use crate::error::Result;
use crate::types::{SourceKind, SymbolSnapshot};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;
use strategies::{CoinGeckoId, CoinGeckoName, CoinGeckoSymbol, TradingViewQuote, YahooEquity};

/// Which asset class dominates the tickers resolved so far in a post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Majority {
    Crypto,
    Equity,
    Unknown,
}

impl Majority {
    /// Only a strict majority gives a hint
    pub fn from_counts(crypto: usize, equity: usize) -> Self {
        match crypto.cmp(&equity) {
            std::cmp::Ordering::Greater => Majority::Crypto,
            std::cmp::Ordering::Less => Majority::Equity,
            std::cmp::Ordering::Equal => Majority::Unknown,
        }
    }
}

/// One lookup in the fallback chain
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Asset class this strategy resolves to
    fn kind(&self) -> SourceKind;

    /// `Ok(None)` when the provider does not know the ticker
    async fn lookup(&self, ticker: &str) -> Result<Option<SymbolSnapshot>>;
}

pub struct SymbolResolver {
    crypto_chain: Vec<Box<dyn ResolveStrategy>>,
    equity_chain: Vec<Box<dyn ResolveStrategy>>,
    min_volume: Decimal,
    /// Uppercase, longest first
    stables: Vec<String>,
}

impl SymbolResolver {
    pub fn new(
        crypto_chain: Vec<Box<dyn ResolveStrategy>>,
        equity_chain: Vec<Box<dyn ResolveStrategy>>,
        min_volume: Decimal,
        stables: &[String],
    ) -> Self {
        let mut stables: Vec<String> = stables.iter().map(|s| s.to_uppercase()).collect();
        stables.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        stables.dedup();

        Self {
            crypto_chain,
            equity_chain,
            min_volume,
            stables,
        }
    }

    /// Standard chain: CoinGecko symbol, TradingView, CoinGecko id,
    /// CoinGecko name, then Yahoo for equities
    pub fn from_providers(
        crypto: Arc<dyn CryptoMarketData>,
        live: Arc<dyn LiveQuoteSource>,
        equity: Arc<dyn EquityQuoteSource>,
        assets: SharedAssets,
        config: &MarketDataConfig,
    ) -> Self {
        let crypto_chain: Vec<Box<dyn ResolveStrategy>> = vec![
            Box::new(CoinGeckoSymbol::new(crypto.clone(), assets.clone())),
            Box::new(TradingViewQuote::new(live)),
            Box::new(CoinGeckoId::new(crypto.clone(), assets.clone())),
            Box::new(CoinGeckoName::new(crypto, assets)),
        ];
        let equity_chain: Vec<Box<dyn ResolveStrategy>> = vec![Box::new(YahooEquity::new(equity))];

        Self::new(crypto_chain, equity_chain, config.min_volume, &config.stables)
    }

    pub fn min_volume(&self) -> Decimal {
        self.min_volume
    }

    /// `BTCUSDT` -> `BTC`. Stable assets themselves are left alone and the
    /// result is never empty.
    pub fn strip_stable_suffix(&self, ticker: &str) -> String {
        let ticker = ticker.to_uppercase();
        if self.stables.contains(&ticker) {
            return ticker;
        }

        for stable in &self.stables {
            if let Some(base) = ticker.strip_suffix(stable.as_str()) {
                if !base.is_empty() {
                    return base.to_string();
                }
            }
        }
        ticker
    }

    /// Volume, exchanges and change all present
    pub fn is_good_enough(&self, snapshot: &SymbolSnapshot) -> bool {
        snapshot.market.as_ref().is_some_and(|m| {
            m.volume >= self.min_volume
                && !m.exchanges.is_empty()
                && m.quotes.iter().any(|q| q.change_pct.is_some())
        })
    }

    pub async fn resolve(&self, ticker: &str, hint: Majority) -> SymbolSnapshot {
        let ticker = ticker.trim().to_uppercase();
        let stripped = self.strip_stable_suffix(&ticker);

        let chain: Vec<&dyn ResolveStrategy> = match hint {
            Majority::Equity => self.equity_chain.iter().chain(&self.crypto_chain),
            Majority::Crypto | Majority::Unknown => {
                self.crypto_chain.iter().chain(&self.equity_chain)
            }
        }
        .map(|s| &**s)
        .collect();

        let mut best: Option<SymbolSnapshot> = None;
        for strategy in chain {
            let query = match strategy.kind() {
                SourceKind::Crypto => stripped.as_str(),
                _ => ticker.as_str(),
            };

            match strategy.lookup(query).await {
                Ok(Some(snapshot)) => {
                    if self.is_good_enough(&snapshot) {
                        tracing::debug!("Resolved {} via {}", ticker, strategy.name());
                        return snapshot;
                    }
                    if volume(&snapshot) > best.as_ref().map_or(Decimal::ZERO, volume) {
                        best = Some(snapshot);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("{} lookup for {} failed: {}", strategy.name(), query, e);
                }
            }
        }

        match best {
            Some(snapshot) => {
                tracing::debug!("Using partial result for {}", ticker);
                snapshot
            }
            None => {
                tracing::debug!("Could not resolve {}", ticker);
                SymbolSnapshot::unresolved(ticker)
            }
        }
    }
}

fn volume(snapshot: &SymbolSnapshot) -> Decimal {
    snapshot
        .market
        .as_ref()
        .map_or(Decimal::ZERO, |m| m.volume)
}

/// Lower-case exchange names, drop the word "exchange", deduplicate
pub fn clean_exchanges<'a>(names: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    names
        .into_iter()
        .map(|name| {
            name.to_lowercase()
                .replace(" exchange", "")
                .replace("exchange", "")
                .trim()
                .to_string()
        })
        .filter(|name| !name.is_empty())
        .collect()
}
