//! Value types, fee tables and rate limiting, without any venue I/O

use multivenue_core::prelude::*;
use multivenue_exchanges::fees::FeeSchedule;
use multivenue_exchanges::prelude::*;
use multivenue_exchanges::{Channel, RateLimitSettings, RateLimitSpec, RateLimiter};
use proptest::prelude::*;
use rstest::*;
use serial_test::serial;
use std::time::{Duration, Instant};

fn fixed(s: &str) -> Fixed {
    Fixed::from_str_exact(s).unwrap()
}

// ============================================================================
// PARAMETERIZED TESTS
// ============================================================================

#[cfg(test)]
mod parameterized_tests {
    use super::*;

    #[rstest]
    #[case("BTC-USDT", "BTC", "USDT")]
    #[case("ltc_btc", "LTC", "BTC")]
    #[case("eth/eur", "ETH", "EUR")]
    #[case("BTCUSD", "BTC", "USD")]
    fn test_pair_parsing(#[case] input: &str, #[case] base: &str, #[case] quote: &str) {
        let pair = TradingPair::parse(input).unwrap();
        assert_eq!(pair.base(), base);
        assert_eq!(pair.quote(), quote);
    }

    #[rstest]
    #[case("", true, "LTCBTC")]
    #[case("", false, "ltcbtc")]
    #[case("-", true, "LTC-BTC")]
    #[case("_", false, "ltc_btc")]
    fn test_pair_formats(#[case] delimiter: &str, #[case] uppercase: bool, #[case] expected: &str) {
        let pair = TradingPair::new("ltc", "btc").unwrap();
        assert_eq!(pair.format(&PairFormat::new(delimiter, uppercase)), expected);
    }

    #[rstest]
    #[case(ExchangeError::Transport("reset".into()), ErrorClass::Retryable)]
    #[case(ExchangeError::Timeout("5s".into()), ErrorClass::Retryable)]
    #[case(ExchangeError::venue("400", "bad"), ErrorClass::Permanent)]
    #[case(ExchangeError::PlacementAmbiguous { matches: 2 }, ErrorClass::Ambiguous)]
    #[case(ExchangeError::not_supported("deposit_address"), ErrorClass::Unsupported)]
    fn test_error_classes(#[case] error: ExchangeError, #[case] class: ErrorClass) {
        assert_eq!(error.class(), class);
    }

    #[rstest]
    #[case(FeeCategory::DepositFee)]
    #[case(FeeCategory::BankDepositFee)]
    #[case(FeeCategory::BankWithdrawalFee)]
    fn test_unpublished_fees_are_zero(#[case] category: FeeCategory) {
        let fees = FeeSchedule::new("test", fixed("0.002"), fixed("0.001"));
        let pair = TradingPair::new("BTC", "USDT").unwrap();
        let request = FeeRequest::trade(&pair, fixed("3"), fixed("6500"), false).with_category(category);
        assert_eq!(fees.fee(&request), Fixed::ZERO);
    }

    #[rstest]
    #[case("100000000000000000000", "100000000000000000000", Fixed::MAX)]
    #[case("79228162514264337593543950335", "1000", Fixed::MAX)]
    #[case("1000000000000000", "100000000000000", fixed("150000000000000000000000000"))]
    fn test_trade_fee_near_decimal_limit(#[case] amount: &str, #[case] price: &str, #[case] expected: Fixed) {
        let fees = FeeSchedule::new("test", fixed("0.0015"), fixed("0.001"));
        let pair = TradingPair::new("BTC", "USDT").unwrap();
        assert_eq!(fees.fee(&FeeRequest::trade(&pair, fixed(amount), fixed(price), false)), expected);
    }

    #[test]
    fn test_mutation_timeout_becomes_unknown_outcome() {
        let error = ExchangeError::Timeout("no response in 5000ms".into()).into_mutation_error("submit_order");
        assert!(matches!(error, ExchangeError::OutcomeUnknown { ref operation, .. } if operation == "submit_order"));
        assert!(!error.is_retryable());
    }
}

// ============================================================================
// PROPERTY-BASED TESTING
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn levels(raw: &[(u32, u32)]) -> Vec<BookLevel> {
        raw.iter()
            .map(|(price, amount)| BookLevel::new(Fixed::from_i64(*price as i64), Fixed::from_i64(*amount as i64)))
            .collect()
    }

    proptest! {
        #[test]
        fn test_book_levels_are_ordered(
            bids in prop::collection::vec((1u32..100_000, 1u32..1_000), 0..50),
            asks in prop::collection::vec((1u32..100_000, 1u32..1_000), 0..50),
        ) {
            let pair = TradingPair::new("BTC", "USD").unwrap();
            let book = OrderBookSnapshot::new("test", pair, MarketType::Spot, levels(&bids), levels(&asks));

            prop_assert!(book.is_well_ordered());
            prop_assert!(book.bids().windows(2).all(|w| w[0].price >= w[1].price));
            prop_assert!(book.asks().windows(2).all(|w| w[0].price <= w[1].price));
            prop_assert_eq!(book.bids().len(), bids.len());
        }

        #[test]
        fn test_trade_fee_is_non_negative_and_maker_not_above_taker(
            amount in prop_oneof![0i64..1_000_000, 0i64..i64::MAX],
            price in prop_oneof![-1_000_000i64..1_000_000, i64::MIN..i64::MAX],
            taker_bps in 0i64..100,
            maker_discount_bps in 0i64..100,
        ) {
            let maker_bps = (taker_bps - maker_discount_bps).max(0);
            let fees = FeeSchedule::new("test", Fixed::from_scaled(taker_bps, 4), Fixed::from_scaled(maker_bps, 4));
            let pair = TradingPair::new("LTC", "BTC").unwrap();
            let taker = fees.fee(&FeeRequest::trade(&pair, Fixed::from_i64(amount), Fixed::from_i64(price), false));
            let maker = fees.fee(&FeeRequest::trade(&pair, Fixed::from_i64(amount), Fixed::from_i64(price), true));

            prop_assert!(!taker.is_negative());
            prop_assert!(maker <= taker);
            if price <= 0 {
                prop_assert_eq!(taker, Fixed::ZERO);
            }
        }

        #[test]
        fn test_balance_total_never_negative(available in -1_000i64..1_000, held in -1_000i64..1_000) {
            let balance = AccountBalance::new("btc", Fixed::from_i64(available), Fixed::from_i64(held));
            prop_assert!(!balance.total().is_negative());
            prop_assert_eq!(balance.currency.as_str(), "BTC");
        }
    }
}

// ============================================================================
// FIXTURE TESTS
// ============================================================================

#[cfg(test)]
mod fixture_tests {
    use super::*;

    #[fixture]
    fn okex_fees() -> FeeSchedule {
        FeeSchedule::new("okex", fixed("0.0015"), fixed("0.001")).with_withdrawal_fees(&[("LTC", fixed("0.001"))])
    }

    #[fixture]
    fn ltc_btc() -> TradingPair {
        TradingPair::new("LTC", "BTC").unwrap()
    }

    #[rstest]
    fn test_withdrawal_fee_lookup(okex_fees: FeeSchedule) {
        assert_eq!(okex_fees.fee(&FeeRequest::withdrawal("ltc", fixed("3"))), fixed("0.001"));
        assert_eq!(okex_fees.withdrawal_fee_known("XYZ"), None);
        assert_eq!(okex_fees.fee(&FeeRequest::withdrawal("XYZ", fixed("3"))), Fixed::ZERO);
    }

    #[rstest]
    fn test_high_quantity_trade_fee(okex_fees: FeeSchedule, ltc_btc: TradingPair) {
        let request = FeeRequest::trade(&ltc_btc, fixed("1000"), fixed("1000"), false);
        assert_eq!(okex_fees.fee(&request), fixed("1500"));
    }

    #[rstest]
    fn test_order_validation(ltc_btc: TradingPair) {
        assert!(OrderRequest::limit(ltc_btc.clone(), OrderSide::Buy, fixed("1"), fixed("0.0086")).validate().is_ok());
        assert!(OrderRequest::limit(ltc_btc.clone(), OrderSide::Buy, fixed("1"), Fixed::ZERO).validate().is_err());
        assert!(OrderRequest::market(ltc_btc, OrderSide::Sell, Fixed::ZERO).validate().is_err());
    }
}

// ============================================================================
// SEQUENTIAL TESTS (timing sensitive)
// ============================================================================

#[cfg(test)]
mod sequential_tests {
    use super::*;

    #[test]
    #[serial]
    fn test_excess_calls_wait_for_the_next_window() {
        let settings = RateLimitSettings {
            authenticated: RateLimitSpec::new(Duration::from_millis(300), 3),
            unauthenticated: RateLimitSpec::unthrottled(),
        };
        let limiter = RateLimiter::new("test", &settings);

        let elapsed = VenueRuntime::new()
            .block_on(async {
                let start = Instant::now();
                for _ in 0..6 {
                    limiter.acquire(Channel::Authenticated).await.unwrap();
                }
                start.elapsed()
            })
            .unwrap();

        // Three admitted at once, then one every 100ms.
        assert!(elapsed >= Duration::from_millis(250), "admitted too early: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "admitted too late: {elapsed:?}");
    }

    #[test]
    #[serial]
    fn test_public_channel_unaffected_by_authenticated_budget() {
        let settings = RateLimitSettings {
            authenticated: RateLimitSpec::new(Duration::from_secs(60), 1),
            unauthenticated: RateLimitSpec::unthrottled(),
        };
        let limiter = RateLimiter::new("test", &settings);

        VenueRuntime::new()
            .block_on(async {
                limiter.acquire(Channel::Authenticated).await.unwrap();
                assert!(!limiter.try_acquire(Channel::Authenticated).unwrap());
                for _ in 0..100 {
                    assert!(limiter.try_acquire(Channel::Public).unwrap());
                }
            })
            .unwrap();
    }
}
