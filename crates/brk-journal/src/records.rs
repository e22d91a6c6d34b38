use serde::{Deserialize, Serialize};

use brk_types::{Micros, Side};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryDecisionKind {
    Entered,
    Blocked,
}

/// Everything the analytics tooling needs to reconstruct why an entry was
/// taken or blocked, without replaying engine state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservedSnapshot {
    pub volume_ratio: Option<f64>,
    pub candle_size_pct: Option<f64>,
    pub room_to_target_pct: Option<f64>,
    pub cvd_slope: Option<f64>,
    pub stoch_k: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryDecision {
    pub timestamp: i64,
    pub symbol: String,
    pub side: Side,
    pub decision: EntryDecisionKind,
    pub reason_code: String,
    pub filter_name: Option<String>,
    pub state_at_decision: String,
    pub observed: ObservedSnapshot,
    pub pivot: Micros,
    pub current_price: Micros,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionEventKind {
    Open,
    Partial,
    StopMove,
    Close,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionEvent {
    pub timestamp: i64,
    pub symbol: String,
    pub event: PositionEventKind,
    pub price: Micros,
    pub shares: i64,
    pub reason: String,
    pub pnl_so_far: Micros,
}
