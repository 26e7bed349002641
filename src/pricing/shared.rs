//! Shared handle over one `TokenPricing` for a single writer and many readers

use ethers::types::Address;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::aggregator::PricingStats;
use super::volume::{VolumeAccumulator, VolumeSummary};
use super::TokenPricing;
use crate::error::PricingResult;
use crate::types::{HistoryPoint, PriceWithVolume, SwapEvent};

/// Cloneable handle; ingestion and reporting tasks each hold one.
///
/// `latest_price_usd` refreshes the memoized USD price and therefore takes
/// the write lock; history and stats reads only take the read lock.
#[derive(Clone)]
pub struct SharedPricing {
    inner: Arc<RwLock<TokenPricing>>,
}

impl SharedPricing {
    pub fn new(pricing: TokenPricing) -> Self {
        Self {
            inner: Arc::new(RwLock::new(pricing)),
        }
    }

    pub async fn record_swap(&self, event: &SwapEvent) -> PricingResult<Decimal> {
        let mut pricing = self.inner.write().await;
        pricing.record_swap(
            event.from_token,
            &event.amount_in,
            event.to_token,
            &event.amount_out,
            event.block_number,
        )
    }

    /// Feed a whole batch under one write lock so readers never see it half applied
    pub async fn accumulate(
        &self,
        accumulator: &VolumeAccumulator,
        events: &[SwapEvent],
    ) -> PricingResult<VolumeSummary> {
        let mut pricing = self.inner.write().await;
        accumulator.accumulate(&mut pricing, events)
    }

    pub async fn latest_price_usd(&self, token: &Address) -> PriceWithVolume {
        self.inner.write().await.latest_price_usd(token)
    }

    pub async fn history_of(&self, token: &Address) -> Vec<HistoryPoint> {
        self.inner.read().await.history_of(token)
    }

    pub async fn stats(&self) -> PricingStats {
        self.inner.read().await.stats()
    }

    pub async fn tick_start(&self) -> u64 {
        self.inner.read().await.tick_start()
    }

    pub async fn symbol(&self, token: &Address) -> String {
        self.inner.read().await.registry().symbol(token)
    }
}
