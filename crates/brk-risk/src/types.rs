use serde::{Deserialize, Serialize};

use brk_types::Micros;

/// Risk configuration: the two session-level guards from §5 — a hard cap
/// on concurrent positions and a daily-loss halt threshold expressed as a
/// fraction of day-start equity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub max_positions: u32,
    /// Fraction of day-start equity, e.g. `0.03` for 3%.
    pub max_daily_loss_fraction: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            max_positions: 5,
            max_daily_loss_fraction: 0.03,
        }
    }
}

/// Inputs for one risk evaluation, taken fresh at each event — the
/// position manager and journal are the source of truth for
/// `open_position_count` and P&L; this crate never mutates them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiskInput {
    pub day_start_equity_micros: Micros,
    pub realized_pnl_micros: Micros,
    pub unrealized_pnl_micros: Micros,
    pub open_position_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReasonCode {
    Allowed,
    AlreadyHalted,
    DailyLossLimitBreached,
    PositionCapReached,
    BadInput,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskAction {
    Allow,
    Reject,
    /// Entries blocked for the remainder of the session; open positions
    /// are still left to the exit policy.
    Halt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RiskDecision {
    pub action: RiskAction,
    pub reason: ReasonCode,
}

impl RiskDecision {
    pub fn allow() -> Self {
        RiskDecision {
            action: RiskAction::Allow,
            reason: ReasonCode::Allowed,
        }
    }

    pub fn is_allow(&self) -> bool {
        self.action == RiskAction::Allow
    }
}

/// Sticky session state: once `halted` is set it stays set for the rest of
/// the trading day — the halt is terminal, not a per-event retry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiskState {
    pub halted: bool,
}

impl RiskState {
    pub fn new() -> Self {
        RiskState { halted: false }
    }
}

impl Default for RiskState {
    fn default() -> Self {
        Self::new()
    }
}
