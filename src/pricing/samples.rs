//! Per-pair price samples collected inside the open tick

use ethers::types::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ordered token pair; `price` of its samples is quote-per-base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenPair {
    pub base: Address,
    pub quote: Address,
}

impl TokenPair {
    pub fn new(base: Address, quote: Address) -> Self {
        Self { base, quote }
    }

    pub fn inverse(&self) -> Self {
        Self {
            base: self.quote,
            quote: self.base,
        }
    }
}

/// One swap's implied rate and the base-token amount it traded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSample {
    pub price: Decimal,
    pub volume: Decimal,
}

/// Samples accumulated for a pair
#[derive(Debug, Clone, Default)]
pub struct PairSamples {
    samples: Vec<PairSample>,
}

impl PairSamples {
    pub fn single(sample: PairSample) -> Self {
        Self {
            samples: vec![sample],
        }
    }

    pub fn push(&mut self, sample: PairSample) {
        self.samples.push(sample);
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PairSample> {
        self.samples.iter()
    }

    /// `None` when the sum leaves the decimal range
    pub fn total_volume(&self) -> Option<Decimal> {
        self.samples
            .iter()
            .try_fold(Decimal::ZERO, |acc, s| acc.checked_add(s.volume))
    }

    /// Volume-weighted average price, `None` when the total volume is zero
    /// or the weighted sum overflows
    pub fn weighted_price(&self) -> Option<Decimal> {
        let total_volume = self.total_volume().filter(|v| !v.is_zero())?;
        let weighted = self.samples.iter().try_fold(Decimal::ZERO, |acc, s| {
            s.price.checked_mul(s.volume).and_then(|pv| acc.checked_add(pv))
        })?;
        weighted.checked_div(total_volume)
    }
}
