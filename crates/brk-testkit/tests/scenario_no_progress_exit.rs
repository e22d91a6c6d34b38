//! A position that enters and then goes nowhere for the no-progress
//! window closes on the time rule rather than riding indefinitely.

use brk_testkit::{bar_ohlc, dollars, flat_warmup, run_session, SetupBuilder};

#[test]
fn stalled_entry_closes_on_time_rule() {
    let setup = SetupBuilder::long("T", 100.00, 100.00)
        .target1(100.80)
        .target2(102.00)
        .score(70)
        .build();

    let mut bars = flat_warmup(9, 20, 27, 99.50, 1000);
    bars.push(bar_ohlc(9, 47, 98.67, 100.25, 2400));
    bars.push(bar_ohlc(9, 48, 100.30, 100.30, 1000));
    // Eight more minutes going nowhere: favorable excursion stays under
    // the 10-cent-per-share minimum progress, and the thin volume keeps
    // every one of these candles failing the sub-average-volume check, so
    // the breakout tracker never climbs back to ready-to-enter while the
    // position sits open.
    for minute in 49..57 {
        bars.push(bar_ohlc(9, minute, 100.32, 100.33, 300));
    }

    let (report, records) = run_session(setup, bars, |cfg| {
        cfg.breakout.cvd_enabled = false;
        cfg.filters.enable_choppy = false;
        cfg.filters.enable_stochastic = false;
    });

    assert!(!report.halted);
    assert_eq!(report.closed_positions.len(), 1);
    let closed = &report.closed_positions[0];
    // Entry fills 0.1% adverse to the trader: 100.30 * 1.001 = 100.4003.
    assert_eq!(closed.entry_price, dollars(100.4003));

    let closed_on_time_rule = records.iter().any(|r| {
        r.topic == "position_events"
            && r.payload.get("event").and_then(|v| v.as_str()) == Some("Close")
            && r.payload.get("reason").and_then(|v| v.as_str()) == Some("TimeRule")
    });
    assert!(closed_on_time_rule, "expected a TimeRule close in the journal: {records:?}");
}
