use brk_types::Micros;

/// Everything the exit policy needs at one event, precomputed upstream by
/// the indicator suite and the scheduler. Rules are pure predicates over
/// this snapshot plus the position itself — none of them reach back into
/// indicator state directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExitInput {
    pub current_price: Micros,
    pub mid_price: Micros,
    pub timestamp: i64,
    pub minute_of_day: u16,

    /// Rule 3 only evaluates on a closed 1-minute candle.
    pub is_candle_close: bool,
    /// The nearest hourly SMA/EMA/Bollinger/linreg level within
    /// `resistance_proximity_pct`, already side-filtered by the caller.
    pub next_resistance_level: Option<Micros>,

    /// Realized high/low over the trailing `stall_window_minutes`, once
    /// that much history exists.
    pub stall_window_high: Option<Micros>,
    pub stall_window_low: Option<Micros>,

    pub shutdown_requested: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExitAction {
    None,
    ClosePosition {
        reason: brk_portfolio::CloseReason,
        exit_price: Micros,
    },
    TakePartial {
        fraction: f64,
        price: Micros,
    },
    TightenTrailing {
        trail_pct: f64,
    },
}
