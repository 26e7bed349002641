//! Well-known Ethereum mainnet tokens and the default pricing-asset ordering

use ethers::types::Address;

use super::Token;

pub const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
pub const WBTC: &str = "0x2260fac5e5542a773aa44fbcfedf7c193bc2c599";
pub const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
pub const DAI: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";
pub const USDT: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";
pub const BAL: &str = "0xba100000625a3754423978a60c9317c58a424e3d";
pub const LINEAR_DAI: &str = "0x804cdb9116a10bb78768d3252355a1b18067bf8f";
pub const LINEAR_USDC: &str = "0x9210f1204b5a24742eba12f710636d76240df3d0";
pub const LINEAR_USDT: &str = "0x2bbf681cc4eb09218bee85ea2a5d3d13fa40fc0c";

/// (address, symbol, decimals)
const WELL_KNOWN: &[(&str, &str, u32)] = &[
    (WETH, "WETH", 18),
    (WBTC, "WBTC", 8),
    (USDC, "USDC", 6),
    (DAI, "DAI", 18),
    (USDT, "USDT", 6),
    (BAL, "BAL", 18),
    (LINEAR_DAI, "LINEAR_DAI", 18),
    (LINEAR_USDC, "LINEAR_USDC", 18),
    (LINEAR_USDT, "LINEAR_USDT", 18),
];

/// Pricing anchors in precedence order: earlier entries win
pub const PRICING_ASSETS: &[&str] = &[
    WETH,
    WBTC,
    USDC,
    DAI,
    USDT,
    BAL,
    LINEAR_DAI,
    LINEAR_USDC,
    LINEAR_USDT,
];

/// Assets whose USD price is pinned to exactly 1
pub const USD_STABLE_ASSETS: &[&str] = &[USDC, DAI, USDT];

pub fn well_known_tokens() -> Vec<Token> {
    WELL_KNOWN
        .iter()
        .filter_map(|(address, symbol, decimals)| {
            address
                .parse::<Address>()
                .ok()
                .map(|addr| Token::new(addr, *symbol, *decimals))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_constant_parses() {
        assert_eq!(well_known_tokens().len(), WELL_KNOWN.len());
        for address in PRICING_ASSETS.iter().chain(USD_STABLE_ASSETS) {
            assert!(address.parse::<Address>().is_ok(), "bad address {}", address);
        }
    }

    #[test]
    fn stables_are_pricing_assets() {
        for stable in USD_STABLE_ASSETS {
            assert!(PRICING_ASSETS.contains(stable));
        }
    }
}
