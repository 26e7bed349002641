//! Balancer V1 pool `LOG_SWAP` and V2 vault `Swap` logs

use ethers::types::{Address, H256, U256};

use super::{LogMeta, NormalizeSwap};
use crate::types::{Protocol, SwapEvent};

/// `LOG_SWAP(caller, tokenIn, tokenOut, tokenAmountIn, tokenAmountOut)`
#[derive(Debug, Clone)]
pub struct BalancerLogSwap {
    pub token_in: Address,
    pub token_out: Address,
    pub token_amount_in: U256,
    pub token_amount_out: U256,
}

impl NormalizeSwap for BalancerLogSwap {
    fn normalize(&self, meta: &LogMeta) -> Option<SwapEvent> {
        Some(SwapEvent {
            from_token: self.token_in,
            to_token: self.token_out,
            amount_in: self.token_amount_in.to_string(),
            amount_out: self.token_amount_out.to_string(),
            block_number: meta.block_number,
            protocol: Protocol::Balancer,
            address: meta.address.clone(),
        })
    }
}

/// Vault `Swap(poolId, tokenIn, tokenOut, amountIn, amountOut)`.
/// Every pool swaps through the vault, so the pool id is the provenance.
#[derive(Debug, Clone)]
pub struct BalancerV2Swap {
    pub pool_id: H256,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
    pub amount_out: U256,
}

impl NormalizeSwap for BalancerV2Swap {
    fn normalize(&self, meta: &LogMeta) -> Option<SwapEvent> {
        Some(SwapEvent {
            from_token: self.token_in,
            to_token: self.token_out,
            amount_in: self.amount_in.to_string(),
            amount_out: self.amount_out.to_string(),
            block_number: meta.block_number,
            protocol: Protocol::BalancerV2,
            address: format!("{:?}", self.pool_id),
        })
    }
}
