//! A clean momentum breakout on heavy volume, once confirmed, opens a
//! long position on the bar after confirmation.

use brk_testkit::{bar_ohlc, dollars, flat_warmup, run_session, SetupBuilder};

#[test]
fn momentum_breakout_on_strong_volume_enters_long() {
    let setup = SetupBuilder::long("T", 100.00, 100.00)
        .target1(100.80)
        .target2(102.00)
        .score(70)
        .build();

    let mut bars = flat_warmup(9, 20, 27, 99.50, 1000);
    // Breakout candle: closes through the 100.00 pivot, volume_ratio 2.4,
    // candle size ~1.6% -- both comfortably past the momentum thresholds.
    bars.push(bar_ohlc(9, 47, 98.67, 100.25, 2400));
    // First bar after confirmation: momentum wait flips to ready-to-enter
    // here, and entry filters evaluate against this bar's price.
    bars.push(bar_ohlc(9, 48, 100.30, 100.30, 1000));

    let (report, records) = run_session(setup, bars, |cfg| {
        cfg.breakout.cvd_enabled = false;
        cfg.filters.enable_choppy = false;
        cfg.filters.enable_stochastic = false;
    });

    assert!(!report.halted);

    let entered = records.iter().any(|r| {
        r.topic == "entry_decisions" && r.payload.get("decision").and_then(|v| v.as_str()) == Some("Entered")
    });
    assert!(entered, "expected an Entered decision in the journal: {records:?}");

    assert_eq!(report.closed_positions.len(), 1);
    let closed = &report.closed_positions[0];
    // Entry fills 0.1% adverse to the trader: 100.30 * 1.001 = 100.4003.
    assert_eq!(closed.entry_price, dollars(100.4003));
}
