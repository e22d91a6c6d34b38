//! Historical 1-minute bar loader for backtest mode. One file per
//! `(symbol, trading day)`, named `{SYMBOL}_{YYYYMMDD}_1min.json`: a flat
//! JSON array of records carrying the exchange-local close timestamp,
//! OHLCV, a VWAP estimate, and a tick count.

use std::path::Path;

use chrono::{DateTime, Timelike};
use serde::Deserialize;

use brk_types::{Bar, Micros};

use crate::types::ReplayError;

/// A full regular session is 09:30-16:00 exchange time, 390 one-minute
/// bars. Anything shorter than this is flagged incomplete; anything
/// below `MIN_BAR_RECORDS` is rejected outright rather than merely
/// logged, since a half-session file usually means a feed outage rather
/// than an early close.
pub const EXPECTED_BAR_RECORDS: usize = 390;
pub const MIN_BAR_RECORDS: usize = 300;

#[derive(Debug, Deserialize)]
struct RawBar {
    date: DateTime<chrono::FixedOffset>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
    average: f64,
    #[serde(rename = "barCount")]
    bar_count: i64,
}

fn dollars(v: f64) -> Micros {
    Micros::new((v * 1_000_000.0).round() as i64)
}

impl RawBar {
    fn into_bar(self) -> Bar {
        Bar {
            ts_epoch: self.date.timestamp(),
            minute_of_day: (self.date.hour() * 60 + self.date.minute()) as u16,
            open: dollars(self.open),
            high: dollars(self.high),
            low: dollars(self.low),
            close: dollars(self.close),
            volume: self.volume,
            vwap_estimate: dollars(self.average),
            tick_count: self.bar_count,
        }
    }
}

/// Outcome of loading one symbol-day file: bars sorted ascending by
/// `ts_epoch`, plus whether the session looked truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSessionBars {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub incomplete: bool,
}

/// Loads and validates one `{SYMBOL}_{YYYYMMDD}_1min.json` file.
///
/// Fewer than [`MIN_BAR_RECORDS`] bars is a fatal data-integrity error
/// (exit 2 at the CLI boundary). Between `MIN_BAR_RECORDS` and
/// [`EXPECTED_BAR_RECORDS`] is accepted but flagged `incomplete` so the
/// caller can decide whether to skip the symbol-day.
pub fn load_session_bars(path: impl AsRef<Path>, symbol: &str) -> Result<LoadedSessionBars, ReplayError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ReplayError::DataIntegrity(format!("read bar file {path:?}: {e}")))?;
    let rows: Vec<RawBar> = serde_json::from_str(&raw)
        .map_err(|e| ReplayError::DataIntegrity(format!("parse bar file {path:?}: {e}")))?;

    if rows.len() < MIN_BAR_RECORDS {
        return Err(ReplayError::DataIntegrity(format!(
            "{path:?} has {} bars, fewer than the minimum {MIN_BAR_RECORDS}",
            rows.len()
        )));
    }

    let mut bars: Vec<Bar> = rows.into_iter().map(RawBar::into_bar).collect();
    bars.sort_by_key(|b| b.ts_epoch);

    for pair in bars.windows(2) {
        if pair[1].ts_epoch <= pair[0].ts_epoch {
            return Err(ReplayError::DataIntegrity(format!(
                "{path:?} has non-monotonic or duplicate timestamps at {}",
                pair[1].ts_epoch
            )));
        }
    }

    let incomplete = bars.len() < EXPECTED_BAR_RECORDS;
    Ok(LoadedSessionBars {
        symbol: symbol.to_string(),
        bars,
        incomplete,
    })
}

/// Conventional filename for a symbol-day bar file.
pub fn session_bar_filename(symbol: &str, date: chrono::NaiveDate) -> String {
    format!("{symbol}_{}_1min.json", date.format("%Y%m%d"))
}
