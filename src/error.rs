//! Errors raised by the pricing engine and token registry

use ethers::types::Address;

/// Local, synchronous failure of a single pricing call
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    /// Token is absent from the registry, so its amounts cannot be scaled
    #[error("unsupported token: {0:?}")]
    UnsupportedToken(Address),

    /// Raw amount is not a non-negative integer string or does not fit a decimal
    #[error("invalid amount {amount:?} for token {token:?}")]
    InvalidAmount { token: Address, amount: String },

    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("tick width must be greater than zero")]
    InvalidTickWidth,
}

pub type PricingResult<T> = std::result::Result<T, PricingError>;

/// Parse a hex address, accepting any letter case
pub fn parse_address(value: &str) -> PricingResult<Address> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|_| PricingError::InvalidAddress(value.to_string()))
}
