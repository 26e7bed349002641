//! Token Pricing - Tick-bucketed USD price/volume aggregation over swaps
//!
//! Consumes swaps in non-decreasing timestamp order and keeps, per ordered
//! token pair, the rate samples seen in the currently open tick. USD prices
//! are derived transitively from the configured pricing assets, and every
//! tick rollover appends a snapshot to the history of the tokens involved.

use ethers::types::Address;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

use super::amount::scale_raw_amount;
use super::samples::{PairSample, PairSamples, TokenPair};
use crate::error::{PricingError, PricingResult};
use crate::tokens::{PricingAssets, TokenRegistry};
use crate::types::{HistoryPoint, PriceWithVolume, PRICE_DECIMALS};

/// Counters for the decisions `record_swap` takes silently
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PricingStats {
    pub swaps_recorded: u64,
    pub ticks_closed: u64,
    /// Swaps older than the open tick whose samples were discarded
    pub late_samples_dropped: u64,
    /// Swaps with a zero input or output amount
    pub degenerate_swaps: u64,
    pub self_swaps: u64,
    /// Swaps whose rate or USD volume does not fit a decimal
    pub unrepresentable_swaps: u64,
}

/// Streaming USD price and volume aggregator
pub struct TokenPricing {
    registry: TokenRegistry,
    assets: PricingAssets,
    /// Width of one tick, in timestamp units
    tick_width: u64,
    /// Lower boundary of the open tick
    tick_start: u64,
    /// Set once the first swap has opened a tick
    tick_opened: bool,
    pair_samples: HashMap<TokenPair, PairSamples>,
    history: HashMap<Address, VecDeque<HistoryPoint>>,
    /// Last computed USD price per token; anchors read their price from here
    usd_price: HashMap<Address, Decimal>,
    /// Maximum history points kept per token, `None` for unbounded
    max_history: Option<usize>,
    stats: PricingStats,
}

impl TokenPricing {
    pub fn new(
        tick_width: u64,
        registry: TokenRegistry,
        assets: PricingAssets,
    ) -> PricingResult<Self> {
        if tick_width == 0 {
            return Err(PricingError::InvalidTickWidth);
        }

        let usd_price = assets
            .usd_stables()
            .map(|stable| (*stable, Decimal::ONE))
            .collect();

        Ok(Self {
            registry,
            assets,
            tick_width,
            tick_start: 0,
            tick_opened: false,
            pair_samples: HashMap::new(),
            history: HashMap::new(),
            usd_price,
            max_history: None,
            stats: PricingStats::default(),
        })
    }

    /// Bound every token's history log; older points are evicted first
    pub fn with_max_history(mut self, max_history: Option<usize>) -> Self {
        self.max_history = max_history.filter(|n| *n > 0);
        self
    }

    /// Fold one swap into the pair statistics and return its USD volume.
    ///
    /// Must be called in non-decreasing `timestamp` order. A swap older than
    /// the open tick still yields its volume, but its samples are dropped.
    pub fn record_swap(
        &mut self,
        from_token: Address,
        amount_in: &str,
        to_token: Address,
        amount_out: &str,
        timestamp: u64,
    ) -> PricingResult<Decimal> {
        let amount_sold = self.scale(&from_token, amount_in)?;
        let amount_bought = self.scale(&to_token, amount_out)?;

        if from_token == to_token {
            self.stats.self_swaps += 1;
            debug!(token = ?from_token, timestamp, "Ignoring self swap");
            return Ok(Decimal::ZERO);
        }

        if amount_sold.is_zero() || amount_bought.is_zero() {
            self.stats.degenerate_swaps += 1;
            debug!(
                from = ?from_token,
                to = ?to_token,
                amount_in,
                amount_out,
                timestamp,
                "Skipping degenerate swap with zero amount"
            );
            return Ok(Decimal::ZERO);
        }

        let rates = amount_bought
            .checked_div(amount_sold)
            .zip(amount_sold.checked_div(amount_bought));
        let Some((forward_rate, backward_rate)) = rates else {
            return Ok(self.skip_unrepresentable(from_token, to_token, timestamp));
        };

        // prices before this swap is folded in
        let from_quote = self.quote_usd(&from_token);
        let to_quote = self.quote_usd(&to_token);

        let volume = match (
            self.assets.is_pricing_asset(&from_token),
            self.assets.is_pricing_asset(&to_token),
        ) {
            (true, true) => amount_sold
                .checked_mul(from_quote.price)
                .zip(amount_bought.checked_mul(to_quote.price))
                .and_then(|(sold, bought)| sold.checked_add(bought))
                .and_then(|legs| legs.checked_div(dec!(2))),
            (true, false) => amount_sold.checked_mul(from_quote.price),
            (false, true) => amount_bought.checked_mul(to_quote.price),
            (false, false) => Some(Decimal::ZERO),
        };
        let Some(volume) = volume else {
            return Ok(self.skip_unrepresentable(from_token, to_token, timestamp));
        };

        let forward = PairSample {
            price: forward_rate,
            volume: amount_sold,
        };
        let backward = PairSample {
            price: backward_rate,
            volume: amount_bought,
        };
        let pair = TokenPair::new(from_token, to_token);

        if !self.tick_opened {
            self.tick_opened = true;
            self.tick_start = timestamp - timestamp % self.tick_width;
            debug!(tick_start = self.tick_start, "Opened first tick");
            self.push_samples(pair, forward, backward);
        } else if timestamp >= self.tick_end() {
            self.append_history(from_token, from_quote);
            self.append_history(to_token, to_quote);

            self.pair_samples.insert(pair, PairSamples::single(forward));
            self.pair_samples
                .insert(pair.inverse(), PairSamples::single(backward));

            let skipped = (timestamp - self.tick_start) / self.tick_width;
            let closed_start = self.tick_start;
            self.tick_start += self.tick_width * skipped;
            self.stats.ticks_closed += 1;
            debug!(
                closed_tick = closed_start,
                tick_start = self.tick_start,
                ticks_advanced = skipped,
                "Tick rolled over"
            );
        } else if timestamp >= self.tick_start {
            self.push_samples(pair, forward, backward);
        } else {
            self.stats.late_samples_dropped += 1;
            debug!(
                timestamp,
                tick_start = self.tick_start,
                from = ?from_token,
                to = ?to_token,
                "Dropping samples of swap older than the open tick"
            );
        }

        self.stats.swaps_recorded += 1;
        Ok(volume.round_dp(PRICE_DECIMALS))
    }

    /// Latest USD price and same-tick volume of a token, rounded for reporting.
    ///
    /// Refreshes the memoized USD price of `token`, which later-listed tokens
    /// anchored on it will use.
    pub fn latest_price_usd(&mut self, token: &Address) -> PriceWithVolume {
        self.quote_usd(token).rounded()
    }

    /// Closed-tick snapshots of a token, oldest first
    pub fn history_of(&self, token: &Address) -> Vec<HistoryPoint> {
        self.history
            .get(token)
            .map(|h| h.iter().map(HistoryPoint::rounded).collect())
            .unwrap_or_default()
    }

    /// Lower boundary of the open tick
    pub fn tick_start(&self) -> u64 {
        self.tick_start
    }

    pub fn tick_width(&self) -> u64 {
        self.tick_width
    }

    pub fn stats(&self) -> PricingStats {
        self.stats
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub fn pricing_assets(&self) -> &PricingAssets {
        &self.assets
    }

    /// Samples currently held for an ordered pair
    pub fn pair_samples(&self, base: &Address, quote: &Address) -> Option<&PairSamples> {
        self.pair_samples.get(&TokenPair::new(*base, *quote))
    }

    /// Rate or volume outside the decimal range: no samples, no tick move
    fn skip_unrepresentable(
        &mut self,
        from_token: Address,
        to_token: Address,
        timestamp: u64,
    ) -> Decimal {
        self.stats.unrepresentable_swaps += 1;
        debug!(
            from = ?from_token,
            to = ?to_token,
            timestamp,
            "Skipping swap whose rate or volume overflows the decimal range"
        );
        Decimal::ZERO
    }

    fn tick_end(&self) -> u64 {
        self.tick_start.saturating_add(self.tick_width)
    }

    fn scale(&self, token: &Address, raw: &str) -> PricingResult<Decimal> {
        let decimals = self.registry.decimals(token)?;
        scale_raw_amount(raw, decimals).ok_or_else(|| PricingError::InvalidAmount {
            token: *token,
            amount: raw.to_string(),
        })
    }

    /// Full-precision price; walks the anchors in order and the first one
    /// with samples for `(token, anchor)` wins. An anchor whose summed
    /// volume overflows is passed over.
    fn quote_usd(&mut self, token: &Address) -> PriceWithVolume {
        let anchored = self.assets.iter().find_map(|anchor| {
            let samples = self.pair_samples.get(&TokenPair::new(*token, *anchor))?;
            if samples.is_empty() {
                return None;
            }
            Some((*anchor, samples.total_volume()?, samples.weighted_price()))
        });

        if self.assets.is_usd_stable(token) {
            self.usd_price.insert(*token, Decimal::ONE);
            return PriceWithVolume {
                price: Decimal::ONE,
                volume: anchored.map(|(_, volume, _)| volume).unwrap_or_default(),
            };
        }

        let Some((anchor, volume, weighted)) = anchored else {
            return PriceWithVolume::ZERO;
        };

        let anchor_usd = self.usd_price.get(&anchor).copied().unwrap_or_default();
        let price = weighted
            .and_then(|w| w.checked_mul(anchor_usd))
            .unwrap_or_default();
        self.usd_price.insert(*token, price);

        PriceWithVolume { price, volume }
    }

    fn push_samples(&mut self, pair: TokenPair, forward: PairSample, backward: PairSample) {
        self.pair_samples.entry(pair).or_default().push(forward);
        self.pair_samples
            .entry(pair.inverse())
            .or_default()
            .push(backward);
    }

    fn append_history(&mut self, token: Address, quote: PriceWithVolume) {
        let history = self.history.entry(token).or_default();
        history.push_back(HistoryPoint {
            price: quote.price,
            volume: quote.volume,
            block_number: self.tick_start,
        });
        if let Some(max) = self.max_history {
            while history.len() > max {
                history.pop_front();
            }
        }
    }
}
