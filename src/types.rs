//! Core types used throughout DexVolume
//!
//! Defines the normalized swap event, protocol tags and the price/volume
//! answers produced by the pricing engine.

use ethers::types::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fractional digits kept in every reported price or volume
pub const PRICE_DECIMALS: u32 = 8;

/// DEX protocol a swap event originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    UniswapV2,
    UniswapV3,
    Curve,
    CurveV2,
    Balancer,
    BalancerV2,
    Bancor,
    Kyber,
    Dodo,
    DodoV2,
}

impl Protocol {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['_', '-', ' '], "").as_str() {
            "uniswapv2" => Some(Protocol::UniswapV2),
            "uniswapv3" => Some(Protocol::UniswapV3),
            "curve" => Some(Protocol::Curve),
            "curvev2" => Some(Protocol::CurveV2),
            "balancer" | "balancerv1" => Some(Protocol::Balancer),
            "balancerv2" => Some(Protocol::BalancerV2),
            "bancor" => Some(Protocol::Bancor),
            "kyber" => Some(Protocol::Kyber),
            "dodo" | "dodov1" => Some(Protocol::Dodo),
            "dodov2" => Some(Protocol::DodoV2),
            _ => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::UniswapV2 => write!(f, "UniswapV2"),
            Protocol::UniswapV3 => write!(f, "UniswapV3"),
            Protocol::Curve => write!(f, "Curve"),
            Protocol::CurveV2 => write!(f, "CurveV2"),
            Protocol::Balancer => write!(f, "Balancer"),
            Protocol::BalancerV2 => write!(f, "BalancerV2"),
            Protocol::Bancor => write!(f, "Bancor"),
            Protocol::Kyber => write!(f, "Kyber"),
            Protocol::Dodo => write!(f, "DODO"),
            Protocol::DodoV2 => write!(f, "DODOV2"),
        }
    }
}

/// A single directional exchange, normalized from any protocol's log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapEvent {
    /// Token paid into the pool
    pub from_token: Address,
    /// Token received from the pool
    pub to_token: Address,
    /// Raw integer amount of `from_token`, in token-native decimals
    pub amount_in: String,
    /// Raw integer amount of `to_token`, in token-native decimals
    pub amount_out: String,
    /// Logical timestamp and ordering key
    pub block_number: u64,
    pub protocol: Protocol,
    /// Pool address, or pool id for vault-style protocols
    pub address: String,
}

impl SwapEvent {
    /// Swaps whose input and output token are the same carry no price information
    pub fn is_self_swap(&self) -> bool {
        self.from_token == self.to_token
    }
}

/// Latest USD price of a token together with the same-tick volume backing it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceWithVolume {
    pub price: Decimal,
    pub volume: Decimal,
}

impl PriceWithVolume {
    /// "Unknown" answer for tokens with no pricing path; zero does not mean worthless
    pub const ZERO: Self = Self {
        price: Decimal::ZERO,
        volume: Decimal::ZERO,
    };

    pub fn is_unpriced(&self) -> bool {
        self.price.is_zero()
    }

    /// Round both fields to the reporting precision
    pub fn rounded(&self) -> Self {
        Self {
            price: self.price.round_dp(PRICE_DECIMALS),
            volume: self.volume.round_dp(PRICE_DECIMALS),
        }
    }
}

/// Snapshot of a token's USD price and volume taken when a tick closes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub price: Decimal,
    pub volume: Decimal,
    /// Lower boundary of the tick that was closed
    pub block_number: u64,
}

impl HistoryPoint {
    pub fn rounded(&self) -> Self {
        Self {
            price: self.price.round_dp(PRICE_DECIMALS),
            volume: self.volume.round_dp(PRICE_DECIMALS),
            block_number: self.block_number,
        }
    }
}
