//! Periodic price reporter over the shared aggregator handle

use anyhow::Result;
use chrono::Utc;
use ethers::types::Address;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::persistence::{CsvPersistence, HistoryRecord};
use crate::pricing::SharedPricing;
use crate::types::PriceWithVolume;

/// Snapshot of one watched token
#[derive(Debug, Clone, PartialEq)]
pub struct TokenReport {
    pub token: Address,
    pub symbol: String,
    pub latest: PriceWithVolume,
    pub history_len: usize,
    /// History points closed since the previous report
    pub new_points: usize,
}

pub struct PriceReporter {
    pricing: SharedPricing,
    watch_tokens: Vec<Address>,
    interval: Duration,
    persistence: Option<Arc<CsvPersistence>>,
    /// Last history block already reported per token
    reported: HashMap<Address, u64>,
}

impl PriceReporter {
    pub fn new(pricing: SharedPricing, watch_tokens: Vec<Address>, interval: Duration) -> Self {
        Self {
            pricing,
            watch_tokens,
            interval,
            persistence: None,
            reported: HashMap::new(),
        }
    }

    pub fn with_persistence(mut self, persistence: Arc<CsvPersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub async fn report_once(&mut self) -> Result<Vec<TokenReport>> {
        let now = Utc::now().timestamp_millis();
        let mut reports = Vec::with_capacity(self.watch_tokens.len());

        for token in &self.watch_tokens {
            let latest = self.pricing.latest_price_usd(token).await;
            let history = self.pricing.history_of(token).await;
            let symbol = self.pricing.symbol(token).await;

            // History blocks are strictly increasing, so the last reported
            // block survives retention trimming as a watermark
            let last = self.reported.get(token).copied();
            let fresh: Vec<HistoryRecord> = history
                .iter()
                .filter(|point| last.map_or(true, |block| point.block_number > block))
                .map(|point| HistoryRecord {
                    timestamp: now,
                    token: format!("{:?}", token),
                    symbol: symbol.clone(),
                    block_number: point.block_number,
                    price: point.price,
                    volume: point.volume,
                })
                .collect();

            if let Some(point) = history.last() {
                self.reported.insert(*token, point.block_number);
            }
            if let Some(persistence) = &self.persistence {
                persistence.save_history(&fresh).await?;
            }

            info!(
                token = %symbol,
                price_usd = %latest.price,
                volume = %latest.volume,
                history = history.len(),
                new_points = fresh.len(),
                "Token price"
            );

            reports.push(TokenReport {
                token: *token,
                symbol,
                latest,
                history_len: history.len(),
                new_points: fresh.len(),
            });
        }

        let stats = self.pricing.stats().await;
        let tick_start = self.pricing.tick_start().await;
        info!(
            swaps = stats.swaps_recorded,
            ticks_closed = stats.ticks_closed,
            late_dropped = stats.late_samples_dropped,
            degenerate = stats.degenerate_swaps,
            unrepresentable = stats.unrepresentable_swaps,
            tick_start,
            "Pricing stats"
        );

        Ok(reports)
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.report_once().await {
                        warn!(error = %e, "Price report failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Price reporter shutdown requested");
                        return Ok(());
                    }
                }
            }
        }
    }
}
