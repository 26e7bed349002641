//! Token registry - static address → symbol/decimals mapping
//!
//! Initialized once at startup and read-only afterwards. The pricing engine
//! scales every raw swap amount through it.

mod assets;
pub mod mainnet;

pub use assets::PricingAssets;

use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{PricingError, PricingResult};

/// ERC-20 token metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    /// Decimal precision used to scale raw integer amounts
    pub decimals: u32,
}

impl Token {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u32) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// Registry of supported tokens keyed by address
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: HashMap<Address, Token>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the well-known mainnet tokens
    pub fn mainnet() -> Self {
        let mut registry = Self::new();
        registry.extend(mainnet::well_known_tokens());
        registry
    }

    /// Register a token, replacing any previous entry for the same address
    pub fn insert(&mut self, token: Token) {
        self.tokens.insert(token.address, token);
    }

    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) {
        for token in tokens {
            self.insert(token);
        }
    }

    pub fn get(&self, address: &Address) -> Option<&Token> {
        self.tokens.get(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.tokens.contains_key(address)
    }

    /// Decimals of a registered token
    pub fn decimals(&self, address: &Address) -> PricingResult<u32> {
        self.get(address)
            .map(|t| t.decimals)
            .ok_or(PricingError::UnsupportedToken(*address))
    }

    /// Symbol for display, falling back to the hex address
    pub fn symbol(&self, address: &Address) -> String {
        self.get(address)
            .map(|t| t.symbol.clone())
            .unwrap_or_else(|| format!("{:?}", address))
    }

    /// Look a token up by symbol (case-insensitive)
    pub fn find_by_symbol(&self, symbol: &str) -> Option<&Token> {
        self.tokens
            .values()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }
}

impl FromIterator<Token> for TokenRegistry {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        let mut registry = Self::new();
        registry.extend(iter);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::parse_address;

    #[test]
    fn mainnet_registry_has_pricing_tokens() {
        let registry = TokenRegistry::mainnet();
        assert_eq!(registry.len(), mainnet::well_known_tokens().len());

        let usdc = registry.find_by_symbol("usdc").unwrap();
        assert_eq!(usdc.decimals, 6);
        let wbtc = registry.find_by_symbol("WBTC").unwrap();
        assert_eq!(wbtc.decimals, 8);
        let weth = registry.find_by_symbol("WETH").unwrap();
        assert_eq!(weth.decimals, 18);
    }

    #[test]
    fn lookup_is_case_insensitive_on_address() {
        let registry = TokenRegistry::mainnet();
        let mixed = parse_address("0xdAC17F958D2ee523a2206206994597C13D831ec7").unwrap();
        assert_eq!(registry.decimals(&mixed).unwrap(), 6);
        assert_eq!(registry.symbol(&mixed), "USDT");
    }

    #[test]
    fn unknown_token_is_unsupported() {
        let registry = TokenRegistry::mainnet();
        let unknown = Address::repeat_byte(0x42);
        assert!(matches!(
            registry.decimals(&unknown),
            Err(PricingError::UnsupportedToken(addr)) if addr == unknown
        ));
    }

    #[test]
    fn insert_overrides_existing_entry() {
        let mut registry = TokenRegistry::mainnet();
        let weth = parse_address(mainnet::WETH).unwrap();
        registry.insert(Token::new(weth, "WETH", 9));
        assert_eq!(registry.decimals(&weth).unwrap(), 9);
    }
}
