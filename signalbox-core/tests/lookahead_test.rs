//! Look-ahead contamination tests for the indicator frame and both strategies.
//!
//! Invariant: no value at row t may depend on price data from row t+1 or later.
//!
//! Method: compute on a truncated series (rows 0..120) and the full series
//! (rows 0..240). Rows 0..120 must be bit-identical between both runs.

use signalbox_core::data::synthetic_series;
use signalbox_core::{
    FrameConfig, IndicatorFrame, IndicatorRow, MeanReversion, PriceSeries, SignalGenerator,
    TrendFollower,
};

const FULL_LEN: usize = 240;
const TRUNCATED_LEN: usize = 120;

fn series() -> PriceSeries {
    synthetic_series("LOOKAHEAD", FULL_LEN, 11)
}

/// NaN-aware equality over every field.
fn same_row(a: &IndicatorRow, b: &IndicatorRow) -> bool {
    let fields = |r: &IndicatorRow| {
        [r.price, r.volume, r.mean, r.std, r.short_mavg, r.long_mavg, r.z_score].map(f64::to_bits)
    };
    a.timestamp == b.timestamp && fields(a) == fields(b)
}

#[test]
fn indicator_frame_has_no_lookahead() {
    let full = series();
    let truncated = full.truncated(TRUNCATED_LEN);
    let config = FrameConfig::new(20, 40, 100).unwrap();

    let full_frame = IndicatorFrame::compute(&full, config);
    let trunc_frame = IndicatorFrame::compute(&truncated, config);

    assert_eq!(trunc_frame.len(), TRUNCATED_LEN);
    for (i, (t, f)) in trunc_frame.rows().iter().zip(full_frame.rows()).enumerate() {
        assert!(same_row(t, f), "row {i} differs: {t:?} vs {f:?}");
    }
}

fn assert_signals_stable(generator: &dyn SignalGenerator) {
    let full = series();
    let truncated = full.truncated(TRUNCATED_LEN);

    let full_out = generator.run(&full);
    let trunc_out = generator.run(&truncated);

    assert_eq!(
        trunc_out.records,
        full_out.records[..TRUNCATED_LEN].to_vec(),
        "{} leaks future data into past signals",
        generator.name()
    );
}

#[test]
fn trend_follower_has_no_lookahead() {
    assert_signals_stable(&TrendFollower::new(10, 30).unwrap());
    assert_signals_stable(&TrendFollower::default_params());
}

#[test]
fn mean_reversion_has_no_lookahead() {
    assert_signals_stable(&MeanReversion::new(15, 1.0).unwrap());
    assert_signals_stable(&MeanReversion::default_params());
}
