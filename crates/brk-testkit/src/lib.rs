//! brk-testkit
//!
//! Shared scenario-test scaffolding: setup/bar builders and a
//! `run_session` helper that drives a full `ReplayEngine` backtest the
//! same way the CLI does, so the `tests/scenario_*.rs` files can assert
//! against journal and portfolio outcomes instead of rebuilding the
//! engine by hand.

use std::collections::BTreeMap;

use brk_journal::{DecisionJournal, JournalWriter};
use brk_scheduler::{ReplayEngine, SchedulerConfig, SessionReport};
use brk_types::{Bar, Micros, Setup, SideHint};
use uuid::Uuid;

pub fn dollars(v: f64) -> Micros {
    Micros::new((v * 1_000_000.0).round() as i64)
}

/// A long-biased setup with every level optional except `resistance`,
/// defaulting the rest to `None` so a scenario only states what it needs.
#[derive(Clone, Debug)]
pub struct SetupBuilder {
    setup: Setup,
}

impl SetupBuilder {
    pub fn long(symbol: &str, resistance: f64, prev_close: f64) -> Self {
        SetupBuilder {
            setup: Setup {
                symbol: symbol.to_string(),
                side_hint: SideHint::LongBiased,
                resistance: Some(dollars(resistance)),
                support: None,
                target1: None,
                target2: None,
                target3: None,
                downside1: None,
                downside2: None,
                score: 70,
                pivot_width_bps: 50,
                test_count: 2,
                prev_close: dollars(prev_close),
                risk_reward_x100: 250,
            },
        }
    }

    pub fn short(symbol: &str, support: f64, prev_close: f64) -> Self {
        let mut b = Self::long(symbol, support, prev_close);
        b.setup.side_hint = SideHint::ShortBiased;
        b.setup.resistance = None;
        b.setup.support = Some(dollars(support));
        b
    }

    pub fn target1(mut self, v: f64) -> Self {
        self.setup.target1 = Some(dollars(v));
        self
    }

    pub fn target2(mut self, v: f64) -> Self {
        self.setup.target2 = Some(dollars(v));
        self
    }

    pub fn target3(mut self, v: f64) -> Self {
        self.setup.target3 = Some(dollars(v));
        self
    }

    pub fn score(mut self, v: i64) -> Self {
        self.setup.score = v;
        self
    }

    pub fn build(self) -> Setup {
        self.setup
    }
}

/// Minute bar at a given `HH:MM` exchange-local time on a nominal
/// session day, with the same OHLC shape around `close` every scenario
/// uses unless it specifically needs a wider or narrower range.
pub fn bar_at(hh: u32, mm: u32, close_dollars: f64, volume: i64) -> Bar {
    let ts = (hh * 3600 + mm * 60) as i64;
    let close = dollars(close_dollars);
    Bar {
        ts_epoch: ts,
        minute_of_day: (hh * 60 + mm) as u16,
        open: close,
        high: close + Micros::new(200_000),
        low: close - Micros::new(200_000),
        close,
        volume,
        vwap_estimate: close,
        tick_count: 60,
    }
}

pub fn bar_at_range(hh: u32, mm: u32, close_dollars: f64, high_dollars: f64, low_dollars: f64, volume: i64) -> Bar {
    let ts = (hh * 3600 + mm * 60) as i64;
    Bar {
        ts_epoch: ts,
        minute_of_day: (hh * 60 + mm) as u16,
        open: dollars(close_dollars),
        high: dollars(high_dollars),
        low: dollars(low_dollars),
        close: dollars(close_dollars),
        volume,
        vwap_estimate: dollars(close_dollars),
        tick_count: 60,
    }
}

/// Like [`bar_at`], with an explicit open distinct from close — needed
/// to drive a specific `candle_size_pct` for a breakout or momentum bar.
pub fn bar_ohlc(hh: u32, mm: u32, open_dollars: f64, close_dollars: f64, volume: i64) -> Bar {
    let ts = (hh * 3600 + mm * 60) as i64;
    let open = dollars(open_dollars);
    let close = dollars(close_dollars);
    let high = if open_dollars >= close_dollars { open } else { close } + Micros::new(50_000);
    let low = if open_dollars <= close_dollars { open } else { close } - Micros::new(50_000);
    Bar {
        ts_epoch: ts,
        minute_of_day: (hh * 60 + mm) as u16,
        open,
        high,
        low,
        close,
        volume,
        vwap_estimate: close,
        tick_count: 60,
    }
}

/// `count` flat minute bars starting at `(hh, mm)`, one minute apart, at
/// a constant price and volume — warms the rolling volume/ATR windows
/// without tripping a breakout.
pub fn flat_warmup(hh: u32, mm: u32, count: u32, price: f64, volume: i64) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let total_min = hh * 60 + mm + i;
            bar_at(total_min / 60, total_min % 60, price, volume)
        })
        .collect()
}

/// Every record a scenario wrote to the journal, parsed back from the
/// JSON Lines file, in write order.
pub fn journal_records(path: &std::path::Path) -> Vec<brk_journal::JournalRecord> {
    let raw = std::fs::read_to_string(path).unwrap_or_default();
    raw.lines()
        .map(|line| serde_json::from_str(line).expect("journal line must parse"))
        .collect()
}

/// Runs one backtest session for a single symbol against
/// `SchedulerConfig::backtest_defaults`, mutated by `configure`. Returns
/// the session report plus every journal record written, in write order.
pub fn run_session(
    setup: Setup,
    bars: Vec<Bar>,
    configure: impl FnOnce(&mut SchedulerConfig),
) -> (SessionReport, Vec<brk_journal::JournalRecord>) {
    let dir = tempfile::tempdir().unwrap();
    let journal_path = dir.path().join("journal.jsonl");
    let writer = JournalWriter::new(&journal_path, true).unwrap();
    let journal = DecisionJournal::new(writer, Uuid::new_v4());

    let mut config = SchedulerConfig::backtest_defaults(Micros::from_dollars(100_000));
    configure(&mut config);

    let symbol = setup.symbol.clone();
    let mut engine = ReplayEngine::new(config, vec![setup], journal);
    let mut bars_by_symbol = BTreeMap::new();
    bars_by_symbol.insert(symbol, bars);
    let report = engine.run_backtest(bars_by_symbol).expect("scenario session must not hit a fatal error");
    let records = journal_records(&journal_path);
    (report, records)
}

/// Same as [`run_session`] but across several symbols at once, for
/// scenarios that exercise the position cap or cross-symbol ordering.
pub fn run_multi_symbol_session(
    setups: Vec<Setup>,
    bars_by_symbol: BTreeMap<String, Vec<Bar>>,
    configure: impl FnOnce(&mut SchedulerConfig),
) -> (SessionReport, Vec<brk_journal::JournalRecord>) {
    let dir = tempfile::tempdir().unwrap();
    let journal_path = dir.path().join("journal.jsonl");
    let writer = JournalWriter::new(&journal_path, true).unwrap();
    let journal = DecisionJournal::new(writer, Uuid::new_v4());

    let mut config = SchedulerConfig::backtest_defaults(Micros::from_dollars(100_000));
    configure(&mut config);

    let mut engine = ReplayEngine::new(config, setups, journal);
    let report = engine.run_backtest(bars_by_symbol).expect("scenario session must not hit a fatal error");
    let records = journal_records(&journal_path);
    (report, records)
}
