//! Uniswap V2 pair and V3 pool `Swap` logs

use ethers::types::{Address, I256, U256};

use super::{LogMeta, NormalizeSwap};
use crate::types::{Protocol, SwapEvent};

/// `Swap(sender, amount0In, amount1In, amount0Out, amount1Out, to)` plus the pair's tokens
#[derive(Debug, Clone)]
pub struct UniswapV2Swap {
    pub token0: Address,
    pub token1: Address,
    pub amount0_in: U256,
    pub amount1_in: U256,
    pub amount0_out: U256,
    pub amount1_out: U256,
}

impl NormalizeSwap for UniswapV2Swap {
    fn normalize(&self, meta: &LogMeta) -> Option<SwapEvent> {
        let (from_token, amount_in) = if !self.amount0_in.is_zero() {
            (self.token0, self.amount0_in)
        } else {
            (self.token1, self.amount1_in)
        };
        let (to_token, amount_out) = if !self.amount1_out.is_zero() {
            (self.token1, self.amount1_out)
        } else {
            (self.token0, self.amount0_out)
        };
        if amount_in.is_zero() && amount_out.is_zero() {
            return None;
        }

        Some(SwapEvent {
            from_token,
            to_token,
            amount_in: amount_in.to_string(),
            amount_out: amount_out.to_string(),
            block_number: meta.block_number,
            protocol: Protocol::UniswapV2,
            address: meta.address.clone(),
        })
    }
}

/// `Swap(sender, recipient, amount0, amount1, sqrtPriceX96, liquidity, tick)`.
/// Amounts are signed from the pool's side: positive was paid in.
#[derive(Debug, Clone)]
pub struct UniswapV3Swap {
    pub token0: Address,
    pub token1: Address,
    pub amount0: I256,
    pub amount1: I256,
}

impl NormalizeSwap for UniswapV3Swap {
    fn normalize(&self, meta: &LogMeta) -> Option<SwapEvent> {
        let (from_token, amount_in, to_token, amount_out) = if self.amount0.is_positive() {
            (self.token0, self.amount0, self.token1, self.amount1)
        } else if self.amount0.is_negative() {
            (self.token1, self.amount1, self.token0, self.amount0)
        } else {
            return None;
        };

        Some(SwapEvent {
            from_token,
            to_token,
            amount_in: amount_in.unsigned_abs().to_string(),
            amount_out: amount_out.unsigned_abs().to_string(),
            block_number: meta.block_number,
            protocol: Protocol::UniswapV3,
            address: meta.address.clone(),
        })
    }
}
