//! Same bars, same config, same watchlist must produce bit-identical
//! results on two independent replays of the same session.

use std::collections::BTreeMap;

use brk_journal::JournalWriter;
use brk_scheduler::{ReplayEngine, SchedulerConfig};
use brk_types::{Bar, Micros, Setup, SideHint};
use uuid::Uuid;

fn setup() -> Setup {
    Setup {
        symbol: "TEST".to_string(),
        side_hint: SideHint::LongBiased,
        resistance: Some(Micros::from_dollars(101)),
        support: None,
        target1: Some(Micros::from_dollars(103)),
        target2: Some(Micros::from_dollars(105)),
        target3: None,
        downside1: None,
        downside2: None,
        score: 80,
        pivot_width_bps: 50,
        test_count: 2,
        prev_close: Micros::from_dollars(100),
        risk_reward_x100: 250,
    }
}

fn minute_bar(ts: i64, close_dollars: f64, volume: i64) -> Bar {
    let close = Micros::new((close_dollars * 1_000_000.0) as i64);
    Bar {
        ts_epoch: ts,
        minute_of_day: ((ts / 60) % 1440) as u16,
        open: close,
        high: close + Micros::new(150_000),
        low: close - Micros::new(150_000),
        close,
        volume,
        vwap_estimate: close,
        tick_count: 60,
    }
}

fn session_bars() -> Vec<Bar> {
    let mut bars = Vec::new();
    let mut ts = 9 * 3600 + 30 * 60;
    for i in 0..40 {
        let close = 100.0 + (i % 3) as f64 * 0.1;
        bars.push(minute_bar(ts, close, 800 + i * 10));
        ts += 60;
    }
    bars
}

fn run_once() -> brk_scheduler::SessionReport {
    let dir = tempfile::tempdir().unwrap();
    let writer = JournalWriter::new(dir.path().join("journal.jsonl"), true).unwrap();
    let journal = brk_journal::DecisionJournal::new(writer, Uuid::new_v4());
    let cfg = SchedulerConfig::backtest_defaults(Micros::from_dollars(100_000));
    let mut engine = ReplayEngine::new(cfg, vec![setup()], journal);

    let mut bars = BTreeMap::new();
    bars.insert("TEST".to_string(), session_bars());
    engine.run_backtest(bars).unwrap()
}

#[test]
fn replaying_the_same_session_twice_yields_identical_reports() {
    let first = run_once();
    let second = run_once();

    assert_eq!(first.closed_positions, second.closed_positions);
    assert_eq!(first.halted, second.halted);
    assert_eq!(first.realized_pnl(), second.realized_pnl());
}
