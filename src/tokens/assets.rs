//! Ordered pricing anchors and the USD-stable subset

use ethers::types::Address;
use std::collections::HashSet;

use super::mainnet;
use crate::error::{parse_address, PricingResult};

/// Pricing assets with explicit first-match-wins precedence.
///
/// The order of `ordered` decides which anchor prices a token when several
/// of them have recorded pair data; `rank` exposes that order directly.
#[derive(Debug, Clone, Default)]
pub struct PricingAssets {
    ordered: Vec<Address>,
    usd_stable: HashSet<Address>,
}

impl PricingAssets {
    /// Build from an ordered anchor list and a stable set.
    ///
    /// Duplicate anchors keep their first position. Stable assets missing
    /// from the anchor list are appended so every stable is also an anchor.
    pub fn new(
        ordered: impl IntoIterator<Item = Address>,
        usd_stable: impl IntoIterator<Item = Address>,
    ) -> Self {
        let mut assets = Self::default();
        for address in ordered {
            if !assets.ordered.contains(&address) {
                assets.ordered.push(address);
            }
        }
        for stable in usd_stable {
            if !assets.ordered.contains(&stable) {
                assets.ordered.push(stable);
            }
            assets.usd_stable.insert(stable);
        }
        assets
    }

    /// Parse both lists from hex strings
    pub fn from_hex<S: AsRef<str>>(ordered: &[S], usd_stable: &[S]) -> PricingResult<Self> {
        let ordered = ordered
            .iter()
            .map(|s| parse_address(s.as_ref()))
            .collect::<PricingResult<Vec<_>>>()?;
        let usd_stable = usd_stable
            .iter()
            .map(|s| parse_address(s.as_ref()))
            .collect::<PricingResult<Vec<_>>>()?;
        Ok(Self::new(ordered, usd_stable))
    }

    /// WETH, WBTC, USDC, DAI, USDT, BAL and the linear stables; USDC/DAI/USDT pinned
    pub fn mainnet() -> PricingResult<Self> {
        Self::from_hex(mainnet::PRICING_ASSETS, mainnet::USD_STABLE_ASSETS)
    }

    /// Position in the precedence order, if the token is an anchor
    pub fn rank(&self, token: &Address) -> Option<usize> {
        self.ordered.iter().position(|a| a == token)
    }

    pub fn is_pricing_asset(&self, token: &Address) -> bool {
        self.rank(token).is_some()
    }

    pub fn is_usd_stable(&self, token: &Address) -> bool {
        self.usd_stable.contains(token)
    }

    /// Anchors in precedence order
    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.ordered.iter()
    }

    pub fn usd_stables(&self) -> impl Iterator<Item = &Address> {
        self.usd_stable.iter()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
