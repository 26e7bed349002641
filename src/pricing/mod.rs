//! Pricing module - Swap-driven USD price and volume estimation
//!
//! Turns a block-ordered stream of normalized swaps into per-token USD
//! prices anchored on a small set of pricing assets, with one history
//! point per closed tick.

mod aggregator;
pub mod amount;
mod samples;
mod shared;
mod volume;

pub use aggregator::{PricingStats, TokenPricing};
pub use samples::{PairSample, PairSamples, TokenPair};
pub use shared::SharedPricing;
pub use volume::{accumulate_volume, ErrorPolicy, VolumeAccumulator, VolumeSummary};
