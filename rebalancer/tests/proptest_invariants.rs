// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! Property-based tests for sizing and rebalance invariants.

use proptest::prelude::*;
use signal_broker::mock::MockBroker;
use signal_broker::{BrokerSide, PositionSide, Price, Symbol};
use signal_rebalancer::audit::AuditLog;
use signal_rebalancer::rebalance::{RebalanceParams, Rebalancer};
use signal_rebalancer::sizing::target_quantity;
use signal_rebalancer::summary::Phase;

fn equity_strategy() -> impl Strategy<Value = i64> {
    0i64..=10_000_000_00i64
}

fn leverage_strategy() -> impl Strategy<Value = u32> {
    1u32..=10_000u32
}

/// Prices in micro-dollars, sub-cent digits included
fn price_strategy() -> impl Strategy<Value = Price> {
    (1i64..=5_000_000_000i64).prop_map(Price)
}

fn side_strategy() -> impl Strategy<Value = PositionSide> {
    prop_oneof![
        Just(PositionSide::Long),
        Just(PositionSide::Short),
        Just(PositionSide::Flat),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // ========================================================================
    // SIZING
    // ========================================================================

    /// Every slot together never spends more than equity × leverage
    #[test]
    fn side_notional_within_budget(
        equity in equity_strategy(),
        lev in leverage_strategy(),
        slots in 1u32..=20,
        prices in prop::collection::vec(price_strategy(), 1..=20),
    ) {
        // cents × bps is the side budget in micro-dollars
        let budget = equity as i128 * lev as i128;
        let spent: i128 = prices
            .iter()
            .take(slots as usize)
            .map(|&p| target_quantity(equity, lev, slots, p) as i128 * p.micros() as i128)
            .sum();
        prop_assert!(spent <= budget, "spent {} > budget {}", spent, budget);
    }

    /// One more share would exceed the slot
    #[test]
    fn quantity_is_the_floor(
        equity in equity_strategy(),
        lev in leverage_strategy(),
        slots in 1u32..=20,
        price in price_strategy(),
    ) {
        let qty = target_quantity(equity, lev, slots, price) as i128;
        let p = price.micros() as i128;
        let slot = equity as i128 * lev as i128 / slots as i128;
        prop_assert!(qty * p <= slot);
        prop_assert!((qty + 1) * p > slot);
    }

    // ========================================================================
    // LIQUIDATION
    // ========================================================================

    /// Every long is sold, every short bought back, flats never touched
    #[test]
    fn liquidation_mirrors_positions(
        held in prop::collection::vec((side_strategy(), 0u64..=1_000), 0..=8),
    ) {
        let mut builder = MockBroker::builder();
        for (i, (side, qty)) in held.iter().enumerate() {
            builder = builder.with_position(Symbol::new(&format!("S{i}")), *side, *qty);
        }
        let broker = builder.build();

        let summary = Rebalancer::new(&broker, &broker, &broker, RebalanceParams::default())
            .run(&mut AuditLog::disabled())
            .unwrap();

        let expected: Vec<_> = held
            .iter()
            .enumerate()
            .filter_map(|(i, (side, qty))| {
                let close = side.closing_side()?;
                (*qty > 0).then(|| (Symbol::new(&format!("S{i}")), close, *qty))
            })
            .collect();
        let actual: Vec<_> = broker
            .submitted_orders()
            .into_iter()
            .map(|o| (o.symbol, o.side, o.quantity))
            .collect();

        prop_assert_eq!(actual, expected);
        prop_assert_eq!(summary.phase_orders(Phase::Opening).count(), 0);
        prop_assert_eq!(summary.skipped.len() + summary.submitted(), held.len());
    }

    /// Opening orders are buys for longs and sells for shorts, never zero
    #[test]
    fn opening_sides_follow_signals(
        equity in equity_strategy(),
        n_long in 0usize..=6,
        n_short in 0usize..=6,
        price in price_strategy(),
    ) {
        let longs: Vec<String> = (0..n_long).map(|i| format!("L{i}")).collect();
        let shorts: Vec<String> = (0..n_short).map(|i| format!("H{i}")).collect();
        let long_refs: Vec<&str> = longs.iter().map(String::as_str).collect();
        let short_refs: Vec<&str> = shorts.iter().map(String::as_str).collect();

        let mut builder = MockBroker::builder().with_equity(equity);
        for s in longs.iter().chain(&shorts) {
            builder = builder.with_price(Symbol::new(s), price);
        }
        let broker = builder.with_signals(&long_refs, &short_refs).build();

        let summary = Rebalancer::new(&broker, &broker, &broker, RebalanceParams::default())
            .run(&mut AuditLog::disabled())
            .unwrap();

        for o in broker.submitted_orders() {
            prop_assert!(o.quantity > 0);
            let expected = if o.symbol.as_str().starts_with('L') {
                BrokerSide::Buy
            } else {
                BrokerSide::Sell
            };
            prop_assert_eq!(o.side, expected);
        }
        // Funded slots are capped at five per side
        prop_assert!(summary.submitted() <= n_long.min(5) + n_short.min(5));
        prop_assert!(summary.is_clean());
    }
}
