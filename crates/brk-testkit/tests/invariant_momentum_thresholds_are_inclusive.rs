//! A breakout candle landing exactly on both momentum thresholds -- volume
//! ratio of 2.0 and candle size of 1.0% -- classifies as momentum, not weak.
//! The thresholds are `>=`, not `>`.

use brk_testkit::{bar_ohlc, dollars, flat_warmup, run_session, SetupBuilder};

#[test]
fn candle_exactly_on_both_thresholds_classifies_as_momentum() {
    let setup = SetupBuilder::long("T", 100.00, 100.00)
        .target1(100.80)
        .target2(102.00)
        .score(70)
        .build();

    let mut bars = flat_warmup(9, 20, 27, 99.50, 1000);
    // candle_size_pct = |101.00-100.00|/100.00 = 1.0% exactly;
    // volume_ratio = 2000/1000 = 2.0 exactly.
    bars.push(bar_ohlc(9, 47, 100.00, 101.00, 2000));
    bars.push(bar_ohlc(9, 48, 101.00, 101.00, 1000));

    let (report, records) = run_session(setup, bars, |cfg| {
        cfg.breakout.cvd_enabled = false;
        cfg.filters.enable_choppy = false;
        cfg.filters.enable_stochastic = false;
    });

    assert!(!report.halted);

    let entered = records.iter().any(|r| {
        r.topic == "entry_decisions" && r.payload.get("decision").and_then(|v| v.as_str()) == Some("Entered")
    });
    assert!(entered, "a candle exactly on both thresholds must still confirm as momentum: {records:?}");

    assert_eq!(report.closed_positions.len(), 1);
    // Entry fills 0.1% adverse to the trader: 101.00 * 1.001 = 101.101.
    assert_eq!(report.closed_positions[0].entry_price, dollars(101.101));

    let failed_as_weak = records.iter().any(|r| {
        r.topic == "entry_decisions"
            && r.payload.get("reason_code").and_then(|v| v.as_str()).map(|s| s.contains("Weak")) == Some(true)
    });
    assert!(!failed_as_weak, "should not have been misclassified as weak: {records:?}");
}
