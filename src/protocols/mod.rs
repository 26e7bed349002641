//! Protocol adapters - decoded DEX swap logs → normalized `SwapEvent`
//!
//! Fetching and ABI decoding happen upstream; these adapters only decide
//! swap direction and which amounts were paid in and out, so the pricing
//! engine can treat every protocol as an opaque token-for-token exchange.

mod balancer;
mod curve;
mod dodo;
mod uniswap;

pub use balancer::{BalancerLogSwap, BalancerV2Swap};
pub use curve::CurveTokenExchange;
pub use dodo::{DodoBuyBase, DodoSellBase};
pub use uniswap::{UniswapV2Swap, UniswapV3Swap};

use crate::types::SwapEvent;

/// Where a log was emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMeta {
    pub block_number: u64,
    /// Emitting contract address
    pub address: String,
}

impl LogMeta {
    pub fn new(block_number: u64, address: impl Into<String>) -> Self {
        Self {
            block_number,
            address: address.into(),
        }
    }
}

/// A decoded swap log that can be expressed as one directional exchange
pub trait NormalizeSwap {
    /// `None` when the log carries no usable direction (e.g. all-zero amounts)
    fn normalize(&self, meta: &LogMeta) -> Option<SwapEvent>;
}

/// Any swap log shape the crate understands
#[derive(Debug, Clone)]
pub enum DecodedSwap {
    UniswapV2(UniswapV2Swap),
    UniswapV3(UniswapV3Swap),
    Curve(CurveTokenExchange),
    Balancer(BalancerLogSwap),
    BalancerV2(BalancerV2Swap),
    DodoBuyBase(DodoBuyBase),
    DodoSellBase(DodoSellBase),
}

impl NormalizeSwap for DecodedSwap {
    fn normalize(&self, meta: &LogMeta) -> Option<SwapEvent> {
        match self {
            DecodedSwap::UniswapV2(log) => log.normalize(meta),
            DecodedSwap::UniswapV3(log) => log.normalize(meta),
            DecodedSwap::Curve(log) => log.normalize(meta),
            DecodedSwap::Balancer(log) => log.normalize(meta),
            DecodedSwap::BalancerV2(log) => log.normalize(meta),
            DecodedSwap::DodoBuyBase(log) => log.normalize(meta),
            DecodedSwap::DodoSellBase(log) => log.normalize(meta),
        }
    }
}

/// Normalize a batch of logs, dropping the ones without a direction
pub fn normalize_logs<'a, I>(logs: I) -> Vec<SwapEvent>
where
    I: IntoIterator<Item = (&'a DecodedSwap, &'a LogMeta)>,
{
    logs.into_iter()
        .filter_map(|(log, meta)| log.normalize(meta))
        .collect()
}
