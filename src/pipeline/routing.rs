//! Channel routing
//!
//! The channel table is built once from configuration; every category slot
//! must be filled, so routing a post can never fail.

use crate::config::{ChannelsConfig, NewsConfig};
use crate::error::{BotError, Result};
use crate::types::{Category, ChannelRef};
use std::collections::{HashMap, HashSet};

/// Category-level destination slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    CryptoCharts,
    CryptoText,
    StocksCharts,
    StocksText,
    Images,
    Other,
    News,
    CryptoNews,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    pub primary: ChannelRef,
    pub author: Option<ChannelRef>,
}

impl RoutingDecision {
    /// Primary first, then the author channel when it differs
    pub fn targets(&self) -> Vec<&ChannelRef> {
        let mut targets = vec![&self.primary];
        if let Some(author) = self.author.as_ref().filter(|a| **a != self.primary) {
            targets.push(author);
        }
        targets
    }
}

#[derive(Debug, Clone)]
pub struct ChannelTable {
    slots: HashMap<Slot, ChannelRef>,
    fallback: ChannelRef,
    /// Lower-cased handle -> dedicated channel
    authors: HashMap<String, ChannelRef>,
    news: HashSet<String>,
    crypto_news: HashSet<String>,
}

fn lowercase_set(handles: &[String]) -> HashSet<String> {
    handles.iter().map(|h| h.to_lowercase()).collect()
}

impl ChannelTable {
    pub fn from_config(channels: &ChannelsConfig, news: &NewsConfig) -> Result<Self> {
        let mut slots = HashMap::new();
        for (slot, id) in [
            (Slot::CryptoCharts, &channels.crypto_charts),
            (Slot::CryptoText, &channels.crypto_text),
            (Slot::StocksCharts, &channels.stocks_charts),
            (Slot::StocksText, &channels.stocks_text),
            (Slot::Images, &channels.images),
            (Slot::Other, &channels.other),
            (Slot::News, &channels.news),
        ] {
            if id.trim().is_empty() {
                return Err(BotError::Config(format!("no channel configured for {:?}", slot)));
            }
            slots.insert(slot, ChannelRef::new(id.trim()));
        }

        match channels.crypto_news.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                slots.insert(Slot::CryptoNews, ChannelRef::new(id));
            }
            _ if !news.crypto_following.is_empty() => {
                return Err(BotError::Config(
                    "crypto_following is set but no crypto_news channel is configured".into(),
                ));
            }
            _ => {}
        }

        let authors = channels
            .authors
            .iter()
            .map(|(handle, id)| (handle.to_lowercase(), ChannelRef::new(id.trim())))
            .collect();

        Ok(Self {
            fallback: ChannelRef::new(channels.other.trim()),
            slots,
            authors,
            news: lowercase_set(&news.following),
            crypto_news: lowercase_set(&news.crypto_following),
        })
    }

    /// Every slot reachable from `route` is checked in `from_config`
    fn slot(&self, slot: Slot) -> &ChannelRef {
        self.slots.get(&slot).unwrap_or(&self.fallback)
    }

    pub fn route(&self, category: Category, has_media: bool, author_handle: &str) -> RoutingDecision {
        let handle = author_handle.to_lowercase();

        let slot = if self.news.contains(&handle) {
            Slot::News
        } else if self.crypto_news.contains(&handle) {
            Slot::CryptoNews
        } else {
            match (category, has_media) {
                (Category::Crypto, true) => Slot::CryptoCharts,
                (Category::Crypto, false) => Slot::CryptoText,
                (Category::Stocks, true) => Slot::StocksCharts,
                (Category::Stocks, false) => Slot::StocksText,
                (Category::None, true) => Slot::Images,
                (Category::None, false) => Slot::Other,
            }
        };

        RoutingDecision {
            primary: self.slot(slot).clone(),
            author: self.authors.get(&handle).cloned(),
        }
    }
}
