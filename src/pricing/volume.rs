//! Volume Accumulator - batch USD volume over a set of swap events
//!
//! Sorts the batch by block number (stable), skips self swaps and feeds
//! every remaining event through `TokenPricing::record_swap`.

use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::TokenPricing;
use crate::error::PricingResult;
use crate::types::{Protocol, SwapEvent};

/// What to do when a single event fails to price
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Propagate the first error; events before it stay recorded
    #[default]
    Abort,
    /// Log the failure, count it and continue with the next event
    Skip,
}

/// Totals of one accumulation batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeSummary {
    pub total: Decimal,
    /// Events fed to the aggregator
    pub swaps: usize,
    pub self_swaps: usize,
    /// Events rejected by the aggregator under `ErrorPolicy::Skip`
    pub failed: usize,
    /// USD volume per pool address (or pool id)
    pub by_pool: HashMap<String, Decimal>,
    pub by_protocol: HashMap<Protocol, Decimal>,
    /// Block range of the fed events
    pub first_block: Option<u64>,
    pub last_block: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeAccumulator {
    policy: ErrorPolicy,
}

impl VolumeAccumulator {
    pub fn new(policy: ErrorPolicy) -> Self {
        Self { policy }
    }

    pub fn accumulate(
        &self,
        pricing: &mut TokenPricing,
        events: &[SwapEvent],
    ) -> PricingResult<VolumeSummary> {
        let mut ordered: Vec<&SwapEvent> = events.iter().collect();
        ordered.sort_by_key(|e| e.block_number);

        let mut summary = VolumeSummary::default();
        for event in ordered {
            if event.is_self_swap() {
                summary.self_swaps += 1;
                continue;
            }

            let volume = match pricing.record_swap(
                event.from_token,
                &event.amount_in,
                event.to_token,
                &event.amount_out,
                event.block_number,
            ) {
                Ok(volume) => volume,
                Err(e) if self.policy == ErrorPolicy::Skip => {
                    warn!(
                        error = %e,
                        pool = %event.address,
                        protocol = %event.protocol,
                        block = event.block_number,
                        "Skipping swap that failed to price"
                    );
                    summary.failed += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            // totals clamp at the decimal range instead of overflowing
            summary.total = summary.total.saturating_add(volume);
            summary.swaps += 1;
            let pool = summary.by_pool.entry(event.address.clone()).or_default();
            *pool = pool.saturating_add(volume);
            let protocol = summary.by_protocol.entry(event.protocol).or_default();
            *protocol = protocol.saturating_add(volume);
            summary.first_block.get_or_insert(event.block_number);
            summary.last_block = Some(event.block_number);
        }

        debug!(
            swaps = summary.swaps,
            self_swaps = summary.self_swaps,
            failed = summary.failed,
            total = %summary.total,
            "Accumulated swap volume"
        );
        Ok(summary)
    }
}

/// Total USD volume of a batch; fails on the first unpriceable event
pub fn accumulate_volume(pricing: &mut TokenPricing, events: &[SwapEvent]) -> PricingResult<Decimal> {
    VolumeAccumulator::default()
        .accumulate(pricing, events)
        .map(|summary| summary.total)
}
