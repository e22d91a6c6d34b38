//! Scanner watchlist loader. Read once per session at startup; the engine
//! never mutates a `Setup` after load, so this module is pure I/O plus
//! format normalization.

use std::path::Path;

use serde::Deserialize;

use brk_types::{Micros, SideHint, Setup};

use crate::types::ReplayError;

/// Raw row shape shared by the JSON-array and CSV encodings. Unknown
/// fields are preserved via `extra` so a round-trip write (not currently
/// exercised by the engine, but available to tooling) doesn't drop them.
#[derive(Debug, Deserialize)]
struct RawSetup {
    symbol: String,
    close: f64,
    resistance: Option<f64>,
    support: Option<f64>,
    target1: Option<f64>,
    target2: Option<f64>,
    target3: Option<f64>,
    downside1: Option<f64>,
    downside2: Option<f64>,
    score: i64,
    risk_reward: f64,
    pivot_width_pct: f64,
    test_count: i64,
    setup_type: SetupType,
    prev_close: f64,
    #[serde(flatten)]
    #[allow(dead_code)]
    extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum SetupType {
    Breakout,
    Breakdown,
}

fn dollars(v: f64) -> Micros {
    Micros::new((v * 1_000_000.0).round() as i64)
}

impl RawSetup {
    fn into_setup(self) -> Setup {
        let side_hint = match self.setup_type {
            SetupType::Breakout => SideHint::LongBiased,
            SetupType::Breakdown => SideHint::ShortBiased,
        };
        Setup {
            symbol: self.symbol,
            side_hint,
            resistance: self.resistance.map(dollars),
            support: self.support.map(dollars),
            target1: self.target1.map(dollars),
            target2: self.target2.map(dollars),
            target3: self.target3.map(dollars),
            downside1: self.downside1.map(dollars),
            downside2: self.downside2.map(dollars),
            score: self.score,
            pivot_width_bps: (self.pivot_width_pct * 100.0).round() as i64,
            test_count: self.test_count,
            prev_close: dollars(self.prev_close),
            risk_reward_x100: (self.risk_reward * 100.0).round() as i64,
        }
    }
}

/// Loads a watchlist file. JSON (a top-level array of objects) is
/// detected by a leading `[` or `{`; anything else is parsed as CSV with
/// the same column set as the JSON object keys.
pub fn load_watchlist(path: impl AsRef<Path>) -> Result<Vec<Setup>, ReplayError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ReplayError::DataIntegrity(format!("read watchlist {path:?}: {e}")))?;

    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') {
        let rows: Vec<RawSetup> = serde_json::from_str(&raw)
            .map_err(|e| ReplayError::DataIntegrity(format!("parse watchlist json {path:?}: {e}")))?;
        Ok(rows.into_iter().map(RawSetup::into_setup).collect())
    } else {
        parse_csv(&raw, path)
    }
}

fn parse_csv(raw: &str, path: &Path) -> Result<Vec<Setup>, ReplayError> {
    let mut lines = raw.lines();
    let header = lines
        .next()
        .ok_or_else(|| ReplayError::DataIntegrity(format!("empty watchlist {path:?}")))?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let mut out = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').collect();
        let mut obj = serde_json::Map::new();
        for (col, cell) in columns.iter().zip(cells.iter()) {
            let cell = cell.trim();
            let value = if cell.is_empty() {
                serde_json::Value::Null
            } else if let Ok(n) = cell.parse::<i64>() {
                serde_json::json!(n)
            } else if let Ok(n) = cell.parse::<f64>() {
                serde_json::json!(n)
            } else {
                serde_json::json!(cell)
            };
            obj.insert((*col).to_string(), value);
        }
        let row: RawSetup = serde_json::from_value(serde_json::Value::Object(obj))
            .map_err(|e| ReplayError::DataIntegrity(format!("parse watchlist csv row {path:?}: {e}")))?;
        out.push(row.into_setup());
    }
    Ok(out)
}
