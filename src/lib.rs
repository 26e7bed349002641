//! DexVolume Library
//!
//! Tick-bucketed USD price and volume aggregation over DEX swap events

pub mod config;
pub mod driver;
pub mod error;
pub mod persistence;
pub mod pricing;
pub mod protocols;
pub mod tokens;
pub mod types;

pub use error::{PricingError, PricingResult};
pub use pricing::{accumulate_volume, SharedPricing, TokenPricing, VolumeAccumulator};
pub use types::{HistoryPoint, PriceWithVolume, Protocol, SwapEvent};
