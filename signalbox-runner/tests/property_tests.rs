//! Property tests for replay and metrics invariants.
//!
//! Uses proptest to verify:
//! 1. Replay emits exactly one portfolio value per signal row
//! 2. Replay never leaves the account short or overdrawn
//! 3. Max drawdown is within [-1, 0] for positive value traces

use proptest::prelude::*;
use signalbox_core::data::synthetic_series;
use signalbox_core::{MeanReversion, SignalGenerator, TrendFollower};
use signalbox_runner::metrics::max_drawdown;
use signalbox_runner::{replay_signals, AccountConfig};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_account() -> impl Strategy<Value = AccountConfig> {
    (100.0..50_000.0_f64, 0.0..0.01_f64, 0.1..20.0_f64).prop_map(|(capital, fee, qty)| {
        AccountConfig {
            initial_capital: capital,
            fee_rate: fee,
            trade_quantity: qty,
        }
    })
}

// ── 1-2. Replay ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn replay_aligned_and_guarded(
        len in 1usize..200,
        seed in any::<u64>(),
        window in 2usize..30,
        threshold in 0.0..2.5_f64,
        account in arb_account(),
    ) {
        let series = synthetic_series("PROP", len, seed);
        let frame = MeanReversion::new(window, threshold).unwrap().run(&series);
        let trace = replay_signals(&frame, &account).unwrap();

        prop_assert_eq!(trace.values.len(), len);
        prop_assert!(trace.final_position >= 0.0);
        prop_assert!(trace.final_capital >= -1e-9);
        prop_assert!(trace.total_fees >= 0.0);
    }

    #[test]
    fn trend_replay_never_rejects_sells(len in 1usize..200, seed in any::<u64>(), short in 1usize..10, extra in 1usize..20) {
        // Trend signals only move between flat and long, so every sell
        // closes a position opened by an earlier buy.
        let series = synthetic_series("PROP", len, seed);
        let frame = TrendFollower::new(short, short + extra).unwrap().run(&series);
        let trace = replay_signals(&frame, &AccountConfig::default()).unwrap();
        prop_assert!(trace.rejected.iter().all(|r| r.side == signalbox_core::Side::Buy));
    }
}

// ── 3. Drawdown bounds ───────────────────────────────────────────────

proptest! {
    #[test]
    fn drawdown_bounded(values in prop::collection::vec(1.0..1e6_f64, 0..100)) {
        let dd = max_drawdown(&values);
        prop_assert!(dd <= 0.0);
        prop_assert!(dd >= -1.0);
    }
}
