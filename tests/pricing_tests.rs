//! Pricing engine integration tests

#[cfg(test)]
mod tests {
    use dexvolume::driver::{JsonlSwapSource, PollingDriver, RetryPolicy};
    use dexvolume::error::{parse_address, PricingError};
    use dexvolume::pricing::{
        accumulate_volume, ErrorPolicy, SharedPricing, TokenPricing, VolumeAccumulator,
    };
    use dexvolume::protocols::{normalize_logs, DecodedSwap, LogMeta, UniswapV2Swap};
    use dexvolume::tokens::{mainnet, PricingAssets, Token, TokenRegistry};
    use dexvolume::types::{Protocol, SwapEvent};
    use ethers::types::{Address, U256};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    const ONE_ETH: &str = "1000000000000000000";

    fn addr(hex: &str) -> Address {
        parse_address(hex).unwrap()
    }

    fn weth() -> Address {
        addr(mainnet::WETH)
    }

    fn usdc() -> Address {
        addr(mainnet::USDC)
    }

    fn uni() -> Address {
        addr("0x1f9840a85d5af5bf1d1762f925bdaddc4201f984")
    }

    fn registry() -> TokenRegistry {
        let mut registry = TokenRegistry::mainnet();
        registry.insert(Token::new(uni(), "UNI", 18));
        registry
    }

    fn pricing(tick_width: u64) -> TokenPricing {
        TokenPricing::new(tick_width, registry(), PricingAssets::mainnet().unwrap()).unwrap()
    }

    /// 1 WETH sold for `usdc` USDC
    fn weth_for_usdc(block_number: u64, usdc_amount: u64) -> SwapEvent {
        SwapEvent {
            from_token: weth(),
            to_token: usdc(),
            amount_in: ONE_ETH.to_string(),
            amount_out: (usdc_amount * 1_000_000).to_string(),
            block_number,
            protocol: Protocol::UniswapV2,
            address: "0xb4e16d0168e52d35cacd2c6185b44281ec28c9dc".to_string(),
        }
    }

    // ============================================================================
    // Stable assets and inverse consistency
    // ============================================================================

    #[test]
    fn test_stables_always_priced_at_one() {
        let mut p = pricing(20);
        let dai = addr(mainnet::DAI);
        // DAI sold below peg must not move its pinned price
        p.record_swap(dai, "1000000000000000000000", usdc(), "950000000", 3)
            .unwrap();
        p.record_swap(weth(), ONE_ETH, usdc(), "2000000000", 30)
            .unwrap();

        for stable in mainnet::USD_STABLE_ASSETS {
            assert_eq!(p.latest_price_usd(&addr(stable)).price, dec!(1));
        }
    }

    #[test]
    fn test_inverse_rates_within_one_tick() {
        let mut p = pricing(20);
        p.record_swap(weth(), ONE_ETH, usdc(), "2000000000", 1)
            .unwrap();
        p.record_swap(usdc(), "2000000000", weth(), ONE_ETH, 2)
            .unwrap();

        let forward = p.pair_samples(&weth(), &usdc()).unwrap();
        let backward = p.pair_samples(&usdc(), &weth()).unwrap();
        assert_eq!(forward.len(), 2);
        assert_eq!(backward.len(), 2);

        let a_per_b = forward.iter().next().unwrap().price;
        let b_per_a = backward.iter().next().unwrap().price;
        assert_eq!(a_per_b, dec!(2000));
        assert_eq!(a_per_b * b_per_a, dec!(1));
    }

    // ============================================================================
    // Tick rollover
    // ============================================================================

    #[test]
    fn test_three_event_rollover_scenario() {
        let mut p = pricing(20);
        for block in [5, 15] {
            p.record_swap(weth(), ONE_ETH, usdc(), "2000000000", block)
                .unwrap();
            assert_eq!(p.tick_start(), 0);
            assert!(p.history_of(&weth()).is_empty());
        }

        p.record_swap(weth(), ONE_ETH, usdc(), "2100000000", 25)
            .unwrap();

        assert_eq!(p.tick_start(), 20);
        let weth_history = p.history_of(&weth());
        let usdc_history = p.history_of(&usdc());
        assert_eq!(weth_history.len(), 1);
        assert_eq!(usdc_history.len(), 1);
        assert_eq!(weth_history[0].block_number, 0);
        assert_eq!(weth_history[0].price, dec!(2000));
        assert_eq!(weth_history[0].volume, dec!(2));
        assert_eq!(usdc_history[0].price, dec!(1));
    }

    #[test]
    fn test_empty_ticks_produce_no_history() {
        let mut p = pricing(20);
        for block in [5, 25, 105] {
            p.record_swap(weth(), ONE_ETH, usdc(), "2000000000", block)
                .unwrap();
        }

        // 40..100 had no swaps and are skipped, not padded
        let blocks: Vec<u64> = p
            .history_of(&weth())
            .iter()
            .map(|h| h.block_number)
            .collect();
        assert_eq!(blocks, vec![0, 20]);
        assert_eq!(p.tick_start(), 100);
        assert_eq!(p.stats().ticks_closed, 2);
    }

    #[test]
    fn test_accumulator_sort_is_load_bearing() {
        let unsorted = vec![
            weth_for_usdc(25, 2100),
            weth_for_usdc(5, 2000),
            weth_for_usdc(15, 2000),
        ];

        let mut sorted_pricing = pricing(20);
        accumulate_volume(&mut sorted_pricing, &unsorted).unwrap();

        let mut direct = pricing(20);
        for event in &unsorted {
            direct
                .record_swap(
                    event.from_token,
                    &event.amount_in,
                    event.to_token,
                    &event.amount_out,
                    event.block_number,
                )
                .unwrap();
        }

        assert_eq!(sorted_pricing.history_of(&weth()).len(), 1);
        assert_eq!(sorted_pricing.stats().late_samples_dropped, 0);

        // Fed unsorted, the first event opens tick 20 and the rest are late
        assert!(direct.history_of(&weth()).is_empty());
        assert_eq!(direct.stats().late_samples_dropped, 2);
        assert_ne!(
            sorted_pricing.history_of(&weth()),
            direct.history_of(&weth())
        );
    }

    // ============================================================================
    // Volume accounting
    // ============================================================================

    #[test]
    fn test_volume_averages_both_legs() {
        let mut p = pricing(20);
        // First swap has no WETH price yet: (1 * 0 + 2000 * 1) / 2
        assert_eq!(
            accumulate_volume(&mut p, &[weth_for_usdc(1, 2000)]).unwrap(),
            dec!(1000)
        );
        assert_eq!(
            accumulate_volume(&mut p, &[weth_for_usdc(2, 2000)]).unwrap(),
            dec!(2000)
        );
    }

    #[test]
    fn test_transitive_price_through_weth() {
        let mut p = pricing(20);
        p.record_swap(weth(), ONE_ETH, usdc(), "2000000000", 1)
            .unwrap();

        // 100 UNI for 1 WETH; only the WETH leg is priceable
        let volume = p
            .record_swap(uni(), "100000000000000000000", weth(), ONE_ETH, 2)
            .unwrap();
        assert_eq!(volume, dec!(2000));

        let quote = p.latest_price_usd(&uni());
        assert_eq!(quote.price, dec!(20));
        assert_eq!(quote.volume, dec!(100));
    }

    #[test]
    fn test_self_swap_is_inert() {
        let mut p = pricing(20);
        let self_swap = SwapEvent {
            to_token: weth(),
            ..weth_for_usdc(5, 2000)
        };

        assert_eq!(accumulate_volume(&mut p, &[self_swap]).unwrap(), dec!(0));
        assert!(p.pair_samples(&weth(), &weth()).is_none());
        assert_eq!(p.stats().swaps_recorded, 0);
        assert_eq!(p.tick_start(), 0);
    }

    #[test]
    fn test_unpriceable_token_is_zero() {
        let mut p = pricing(20);
        let quote = p.latest_price_usd(&uni());
        assert!(quote.is_unpriced());
        assert_eq!(quote.volume, dec!(0));
    }

    // ============================================================================
    // Errors
    // ============================================================================

    #[test]
    fn test_unsupported_token_fails_without_mutation() {
        let mut p = pricing(20);
        let unknown = Address::repeat_byte(0x77);

        let err = p
            .record_swap(unknown, "1", usdc(), "1000000", 5)
            .unwrap_err();
        assert!(matches!(err, PricingError::UnsupportedToken(a) if a == unknown));
        assert_eq!(p.stats().swaps_recorded, 0);
        assert!(p.pair_samples(&usdc(), &unknown).is_none());
    }

    #[test]
    fn test_skip_policy_keeps_batch_going() {
        let mut p = pricing(20);
        let bad = SwapEvent {
            from_token: Address::repeat_byte(0x77),
            ..weth_for_usdc(3, 2000)
        };
        let events = vec![weth_for_usdc(1, 2000), bad, weth_for_usdc(5, 2000)];

        assert!(accumulate_volume(&mut p, &events).is_err());

        let mut p = pricing(20);
        let summary = VolumeAccumulator::new(ErrorPolicy::Skip)
            .accumulate(&mut p, &events)
            .unwrap();
        assert_eq!(summary.swaps, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total, dec!(3000));
    }

    // ============================================================================
    // Protocol logs to prices
    // ============================================================================

    #[test]
    fn test_uniswap_log_feeds_aggregator() {
        // WETH/USDC pair with token0 = USDC
        let log = DecodedSwap::UniswapV2(UniswapV2Swap {
            token0: usdc(),
            token1: weth(),
            amount0_in: U256::zero(),
            amount1_in: U256::from_dec_str(ONE_ETH).unwrap(),
            amount0_out: U256::from(1_990_000_000u64),
            amount1_out: U256::zero(),
        });
        let meta = LogMeta::new(12, "0xb4e16d0168e52d35cacd2c6185b44281ec28c9dc");
        let events = normalize_logs([(&log, &meta)]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].from_token, weth());

        let mut p = pricing(20);
        accumulate_volume(&mut p, &events).unwrap();
        assert_eq!(p.latest_price_usd(&weth()).price, dec!(1990));
    }

    // ============================================================================
    // Driver over a replay file
    // ============================================================================

    #[tokio::test]
    async fn test_driver_replays_file_in_block_order() {
        let path = std::env::temp_dir().join(format!(
            "dexvolume_it_replay_{}.jsonl",
            uuid::Uuid::new_v4()
        ));
        let lines: Vec<String> = [(25, 2100), (5, 2000), (15, 2000)]
            .into_iter()
            .map(|(block, usdc)| serde_json::to_string(&weth_for_usdc(block, usdc)).unwrap())
            .collect();
        std::fs::write(&path, lines.join("\n")).unwrap();

        let shared = SharedPricing::new(pricing(20));
        let mut driver = PollingDriver::new(
            shared.clone(),
            VolumeAccumulator::new(ErrorPolicy::Abort),
            RetryPolicy::default(),
            Duration::from_secs(15),
            0,
        )
        .with_source(Box::new(JsonlSwapSource::new(&path)));

        let summary = driver.poll_once().await.unwrap();
        assert_eq!(summary.swaps, 3);
        assert_eq!(driver.cursor(), 26);

        let history = shared.history_of(&weth()).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].price, dec!(2000));
        assert_eq!(shared.latest_price_usd(&weth()).await.price, dec!(2100));

        let _ = std::fs::remove_file(&path);
    }
}
