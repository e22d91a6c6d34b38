//! The open-position cap is a hard ceiling: when two symbols confirm a
//! breakout on the same bar and the cap only has room for one, the second
//! is blocked by the risk guard rather than entering anyway.

use std::collections::BTreeMap;

use brk_testkit::{bar_ohlc, flat_warmup, run_multi_symbol_session, SetupBuilder};

#[test]
fn second_simultaneous_entry_is_blocked_once_the_cap_is_full() {
    let setup_a = SetupBuilder::long("AAA", 100.00, 100.00)
        .target1(100.80)
        .target2(102.00)
        .score(70)
        .build();
    let setup_b = SetupBuilder::long("BBB", 100.00, 100.00)
        .target1(100.80)
        .target2(102.00)
        .score(70)
        .build();

    let mut bars_a = flat_warmup(9, 20, 27, 99.50, 1000);
    bars_a.push(bar_ohlc(9, 47, 98.67, 100.25, 2400));
    bars_a.push(bar_ohlc(9, 48, 100.30, 100.30, 1000));

    let mut bars_b = flat_warmup(9, 20, 27, 99.50, 1000);
    bars_b.push(bar_ohlc(9, 47, 98.67, 100.25, 2400));
    bars_b.push(bar_ohlc(9, 48, 100.30, 100.30, 1000));

    let mut bars_by_symbol = BTreeMap::new();
    bars_by_symbol.insert("AAA".to_string(), bars_a);
    bars_by_symbol.insert("BBB".to_string(), bars_b);

    let (report, records) = run_multi_symbol_session(vec![setup_a, setup_b], bars_by_symbol, |cfg| {
        cfg.breakout.cvd_enabled = false;
        cfg.filters.enable_choppy = false;
        cfg.filters.enable_stochastic = false;
        cfg.risk.max_positions = 1;
    });

    assert!(!report.halted);

    let entered: Vec<_> = records
        .iter()
        .filter(|r| {
            r.topic == "entry_decisions" && r.payload.get("decision").and_then(|v| v.as_str()) == Some("Entered")
        })
        .collect();
    assert_eq!(entered.len(), 1, "only one position should fit under the cap: {records:?}");

    let blocked_on_position_cap = records.iter().any(|r| {
        r.topic == "entry_decisions"
            && r.payload.get("decision").and_then(|v| v.as_str()) == Some("Blocked")
            && r.payload.get("reason_code").and_then(|v| v.as_str()) == Some("PositionCapReached")
    });
    assert!(blocked_on_position_cap, "expected a PositionCapReached block in the journal: {records:?}");

    assert_eq!(report.closed_positions.len(), 1);
}
