use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use brk_breakout::BreakoutType;
use brk_types::{Micros, Side};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartialReason {
    /// A discrete ladder level (1R, 2R, scanner target) was crossed.
    Ladder,
    /// An extra partial taken because a dynamic resistance ceiling/floor
    /// was reached (see the exit policy's rule 3).
    ResistanceProximity,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Partial {
    pub timestamp: i64,
    pub price: Micros,
    pub shares: i64,
    pub reason: PartialReason,
    /// Net of commission for this leg only.
    pub pnl_micros: Micros,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    Stop,
    TimeRule,
    Eod,
    /// A cooperative shutdown flush, distinct from the scheduled EOD flush.
    Shutdown,
    Manual,
}

/// A single open position. At most one per symbol, enforced by the
/// position manager's registry, never by this type itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    pub entry_price: Micros,
    pub entry_time: i64,
    pub initial_shares: i64,
    pub remaining_shares: i64,
    pub partials: Vec<Partial>,

    /// Monotonic: never moves adverse (decreases for LONG, increases for
    /// SHORT).
    pub stop_price: Micros,

    /// Ordered, deduplicated, sorted in the favorable direction. Consumed
    /// from the front as partials fire.
    pub partial_targets: Vec<Micros>,
    pub partial_fractions: Vec<f64>,
    pub ladder_head: usize,

    pub pivot: Micros,
    pub peak_favorable: Micros,
    pub trough_adverse: Micros,
    pub breakout_type: BreakoutType,

    /// The scanner's `target1`, captured at open — independent of whether
    /// it ended up on the partial ladder. Used by the exit policy's stall
    /// rule to recognize "target1 has been hit".
    pub target1_price: Option<Micros>,

    /// Armed once the discrete ladder is exhausted; the stop then tracks
    /// `peak_favorable` instead of a fixed ladder level.
    pub trailing_active: bool,
    pub trail_pct: f64,

    /// Set the first time a partial fires; the no-progress exit rule
    /// never applies again once this is `Some`.
    pub stall_window_origin: Option<i64>,
    pub stall_armed: bool,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.remaining_shares == 0
    }

    pub fn partials_filled(&self) -> usize {
        self.ladder_head
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClosedPosition {
    pub symbol: String,
    pub side: Side,
    pub entry_price: Micros,
    pub exit_price: Micros,
    pub exit_time: i64,
    pub reason: CloseReason,
    pub shares_closed: i64,
    pub pnl_micros: Micros,
}

/// Registry of open positions, keyed by symbol (at most one entry per
/// symbol), plus the day's realized P&L and closed-position history.
#[derive(Clone, Debug, Default)]
pub struct PortfolioState {
    pub positions: BTreeMap<String, Position>,
    pub realized_pnl_micros: Micros,
    pub closed: Vec<ClosedPosition>,
}

impl PortfolioState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_position_count(&self) -> u32 {
        self.positions.len() as u32
    }
}
