//! Call budget for rate-limited providers
//!
//! Calls are spaced evenly: a budget of 50 calls per minute lets one call
//! through every 1.2 seconds.

use super::{CoinDetail, CoinListing, CryptoMarketData};
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct CallBudget {
    spacing: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl CallBudget {
    /// `0` disables throttling
    pub fn per_minute(calls: u32) -> Self {
        let spacing = if calls == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(60) / calls
        };
        Self {
            spacing,
            next_slot: Mutex::new(None),
        }
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    /// Wait for the next free slot and claim it
    pub async fn acquire(&self) {
        let mut next_slot = self.next_slot.lock().await;
        let now = Instant::now();
        let slot = match *next_slot {
            Some(slot) if slot > now => {
                tokio::time::sleep_until(slot).await;
                slot
            }
            _ => now,
        };
        *next_slot = Some(slot + self.spacing);
    }
}

/// Wraps a crypto provider so every call goes through a [`CallBudget`]
pub struct Throttled<C> {
    inner: C,
    budget: CallBudget,
}

impl<C> Throttled<C> {
    pub fn new(inner: C, budget: CallBudget) -> Self {
        Self { inner, budget }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: CryptoMarketData> CryptoMarketData for Throttled<C> {
    async fn coin_list(&self) -> Result<Vec<CoinListing>> {
        self.budget.acquire().await;
        self.inner.coin_list().await
    }

    async fn coin_detail(&self, id: &str) -> Result<CoinDetail> {
        self.budget.acquire().await;
        self.inner.coin_detail(id).await
    }
}
