//! DODO `BuyBaseToken` / `SellBaseToken` logs

use ethers::types::{Address, U256};

use super::{LogMeta, NormalizeSwap};
use crate::types::{Protocol, SwapEvent};

/// `BuyBaseToken(buyer, receiveBase, payQuote)`: quote paid in, base out
#[derive(Debug, Clone)]
pub struct DodoBuyBase {
    pub base_token: Address,
    pub quote_token: Address,
    pub receive_base: U256,
    pub pay_quote: U256,
}

/// `SellBaseToken(seller, payBase, receiveQuote)`: base paid in, quote out
#[derive(Debug, Clone)]
pub struct DodoSellBase {
    pub base_token: Address,
    pub quote_token: Address,
    pub pay_base: U256,
    pub receive_quote: U256,
}

impl NormalizeSwap for DodoBuyBase {
    fn normalize(&self, meta: &LogMeta) -> Option<SwapEvent> {
        Some(SwapEvent {
            from_token: self.quote_token,
            to_token: self.base_token,
            amount_in: self.pay_quote.to_string(),
            amount_out: self.receive_base.to_string(),
            block_number: meta.block_number,
            protocol: Protocol::Dodo,
            address: meta.address.clone(),
        })
    }
}

impl NormalizeSwap for DodoSellBase {
    fn normalize(&self, meta: &LogMeta) -> Option<SwapEvent> {
        Some(SwapEvent {
            from_token: self.base_token,
            to_token: self.quote_token,
            amount_in: self.pay_base.to_string(),
            amount_out: self.receive_quote.to_string(),
            block_number: meta.block_number,
            protocol: Protocol::Dodo,
            address: meta.address.clone(),
        })
    }
}
