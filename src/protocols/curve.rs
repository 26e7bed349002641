//! Curve `TokenExchange` logs

use ethers::types::{Address, U256};

use super::{LogMeta, NormalizeSwap};
use crate::types::{Protocol, SwapEvent};

/// `TokenExchange(buyer, sold_id, tokens_sold, bought_id, tokens_bought)`;
/// coin indices are resolved against the pool's coin list
#[derive(Debug, Clone)]
pub struct CurveTokenExchange {
    pub coins: Vec<Address>,
    pub sold_id: i128,
    pub tokens_sold: U256,
    pub bought_id: i128,
    pub tokens_bought: U256,
    /// Crypto (v2) pools rather than StableSwap pools
    pub crypto_pool: bool,
}

impl CurveTokenExchange {
    fn coin(&self, id: i128) -> Option<Address> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.coins.get(index))
            .copied()
    }
}

impl NormalizeSwap for CurveTokenExchange {
    fn normalize(&self, meta: &LogMeta) -> Option<SwapEvent> {
        let from_token = self.coin(self.sold_id)?;
        let to_token = self.coin(self.bought_id)?;

        Some(SwapEvent {
            from_token,
            to_token,
            amount_in: self.tokens_sold.to_string(),
            amount_out: self.tokens_bought.to_string(),
            block_number: meta.block_number,
            protocol: if self.crypto_pool {
                Protocol::CurveV2
            } else {
                Protocol::Curve
            },
            address: meta.address.clone(),
        })
    }
}
