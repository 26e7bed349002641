//! Polling driver - pulls swap events from every source and feeds them to
//! the shared aggregator in block order
//!
//! Each round fetches all sources concurrently from one cursor. A round is
//! applied only when every source answered, so a slow source can never make
//! the others' later blocks reach the aggregator first.

mod replay;
mod report;

pub use replay::JsonlSwapSource;
pub use report::{PriceReporter, TokenReport};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures_util::future::join_all;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::DriverConfig;
use crate::error::PricingError;
use crate::persistence::{CsvPersistence, VolumeRecord};
use crate::pricing::{SharedPricing, VolumeAccumulator, VolumeSummary};
use crate::types::SwapEvent;

/// Upper bound for a single backoff sleep
const MAX_BACKOFF: Duration = Duration::from_secs(30);
/// +/- share of the backoff randomized per attempt
const BACKOFF_JITTER_RATIO: f64 = 0.2;

/// Producer of decoded swap events
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapSource: Send + Sync {
    /// Source name for logs
    fn name(&self) -> &'static str;

    /// Events with `block_number >= from_block` known to the source
    async fn fetch_swaps(&mut self, from_block: u64) -> Result<Vec<SwapEvent>>;
}

/// Timeout and retry settings for one source fetch
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub fetch_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &DriverConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_backoff: Duration::from_millis(config.base_backoff_ms),
            max_backoff: MAX_BACKOFF,
            fetch_timeout: config.fetch_timeout(),
        }
    }

    /// Exponential backoff with jitter, never above `max_backoff`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let capped_attempt = attempt.min(16);
        let base = self
            .base_backoff
            .saturating_mul(1u32 << capped_attempt)
            .min(self.max_backoff);

        let unit: f64 = rand::thread_rng().gen_range(-1.0..=1.0);
        let jittered = base.as_secs_f64() * (1.0 + unit * BACKOFF_JITTER_RATIO);
        Duration::from_secs_f64(jittered.clamp(0.0, self.max_backoff.as_secs_f64()))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_millis(500),
            max_backoff: MAX_BACKOFF,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

/// Fetch from one source, retrying timeouts and errors with backoff
pub async fn fetch_with_retry(
    source: &mut dyn SwapSource,
    from_block: u64,
    policy: &RetryPolicy,
) -> Result<Vec<SwapEvent>> {
    let name = source.name();
    let mut attempt = 0u32;
    loop {
        let error = match tokio::time::timeout(policy.fetch_timeout, source.fetch_swaps(from_block))
            .await
        {
            Ok(Ok(events)) => return Ok(events),
            Ok(Err(e)) => e,
            Err(_) => anyhow!("fetch timed out after {:?}", policy.fetch_timeout),
        };

        if attempt >= policy.max_retries {
            return Err(error.context(format!(
                "source {} failed after {} attempts",
                name,
                attempt + 1
            )));
        }

        let delay = policy.backoff(attempt);
        warn!(
            source = name,
            attempt,
            backoff_ms = delay.as_millis() as u64,
            error = %error,
            "Swap fetch failed, retrying with exponential backoff + jitter"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Single-writer ingestion loop over a set of sources
pub struct PollingDriver {
    sources: Vec<Box<dyn SwapSource>>,
    pricing: SharedPricing,
    accumulator: VolumeAccumulator,
    retry: RetryPolicy,
    poll_interval: Duration,
    cursor: u64,
    persistence: Option<Arc<CsvPersistence>>,
}

impl PollingDriver {
    pub fn new(
        pricing: SharedPricing,
        accumulator: VolumeAccumulator,
        retry: RetryPolicy,
        poll_interval: Duration,
        start_block: u64,
    ) -> Self {
        Self {
            sources: Vec::new(),
            pricing,
            accumulator,
            retry,
            poll_interval,
            cursor: start_block,
            persistence: None,
        }
    }

    pub fn with_source(mut self, source: Box<dyn SwapSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_persistence(mut self, persistence: Arc<CsvPersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Next block to ingest
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Run one polling round.
    ///
    /// Fails without touching the aggregator or the cursor when any source
    /// fails after retries. Pricing failures under the abort policy are
    /// returned after the cursor moved past the partially applied batch.
    pub async fn poll_once(&mut self) -> Result<VolumeSummary> {
        let cursor = self.cursor;
        let retry = &self.retry;

        let results = join_all(
            self.sources
                .iter_mut()
                .map(|source| fetch_with_retry(source.as_mut(), cursor, retry)),
        )
        .await;

        let mut events = Vec::new();
        for result in results {
            events.extend(result.context("Polling round abandoned")?);
        }

        events.retain(|e| e.block_number >= cursor);
        events.sort_by_key(|e| e.block_number);

        let Some(max_block) = events.last().map(|e| e.block_number) else {
            debug!(cursor, "No new swap events");
            return Ok(VolumeSummary::default());
        };

        let outcome = self.pricing.accumulate(&self.accumulator, &events).await;
        self.cursor = max_block + 1;
        let summary = outcome.context("Failed to price swap batch")?;

        info!(
            events = events.len(),
            swaps = summary.swaps,
            failed = summary.failed,
            from_block = cursor,
            to_block = max_block,
            volume_usd = %summary.total,
            "Ingested polling round"
        );

        if let Some(persistence) = &self.persistence {
            persistence
                .save_volume(VolumeRecord {
                    timestamp: Utc::now().timestamp_millis(),
                    first_block: summary.first_block.unwrap_or(cursor),
                    last_block: summary.last_block.unwrap_or(max_block),
                    swaps: summary.swaps,
                    failed: summary.failed,
                    volume_usd: summary.total,
                })
                .await?;
        }

        Ok(summary)
    }

    /// Poll until shutdown is signalled. Source failures are retried next
    /// round; a pricing failure stops the driver.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            sources = self.sources.len(),
            start_block = self.cursor,
            interval_secs = self.poll_interval.as_secs(),
            "Polling driver started"
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.poll_once().await {
                        if e.downcast_ref::<PricingError>().is_some() {
                            return Err(e);
                        }
                        warn!(error = %e, cursor = self.cursor, "Polling round failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(cursor = self.cursor, "Polling driver shutdown requested");
                        return Ok(());
                    }
                }
            }
        }
    }
}
