//! Local table of listed crypto assets
//!
//! Built from the CoinGecko coin list and swapped wholesale on refresh.

use crate::client::{CoinListing, CryptoMarketData};
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Asset table shared between the resolver and the refresh task
pub type SharedAssets = Arc<RwLock<AssetTable>>;

#[derive(Debug, Default, Clone)]
pub struct AssetTable {
    /// Uppercase symbol -> coin ids, in listing order
    by_symbol: HashMap<String, Vec<String>>,
    ids: HashSet<String>,
    /// Exact display name -> coin id
    by_name: HashMap<String, String>,
}

impl AssetTable {
    pub fn from_listings(listings: impl IntoIterator<Item = CoinListing>) -> Self {
        let mut table = Self::default();
        for coin in listings {
            table
                .by_symbol
                .entry(coin.symbol.to_uppercase())
                .or_default()
                .push(coin.id.clone());
            table.by_name.entry(coin.name).or_insert_with(|| coin.id.clone());
            table.ids.insert(coin.id);
        }
        table
    }

    /// Fetch the coin list from the provider
    pub async fn load(market: &dyn CryptoMarketData) -> Result<Self> {
        let listings = market.coin_list().await?;
        Ok(Self::from_listings(listings))
    }

    pub fn into_shared(self) -> SharedAssets {
        Arc::new(RwLock::new(self))
    }

    /// Candidate ids for a symbol, more than one when the symbol is ambiguous
    pub fn ids_for_symbol(&self, symbol: &str) -> Vec<String> {
        self.by_symbol
            .get(&symbol.to_uppercase())
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn id_for_name(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Reload the table in place, keeping the old one when the fetch fails
pub async fn refresh(shared: &SharedAssets, market: &dyn CryptoMarketData) -> Result<usize> {
    let fresh = AssetTable::load(market).await?;
    let count = fresh.len();
    *shared.write() = fresh;
    tracing::info!("Asset table refreshed, {} coins", count);
    Ok(count)
}
