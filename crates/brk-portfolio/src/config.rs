use serde::{Deserialize, Serialize};

use brk_types::Micros;

/// Position sizing, ladder, stop, and trailing parameters — everything C5
/// needs besides the live market and tracker snapshot it is handed at each
/// call.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionConfig {
    /// Fraction of account equity risked per trade.
    pub risk_per_trade: f64,
    pub min_shares: i64,
    pub max_shares: i64,
    /// Distance from the pivot to the initial stop (long: below, short:
    /// above).
    pub stop_pivot_buffer: Micros,
    /// Applied to the previously hit ladder level when advancing the stop.
    pub ladder_step_buffer_pct: f64,
    /// Trailing distance on the runner, as a fraction of price.
    pub trail_pct: f64,
    pub commission_per_share: Micros,
}

impl Default for PositionConfig {
    fn default() -> Self {
        PositionConfig {
            risk_per_trade: 0.01,
            min_shares: 1,
            max_shares: 10_000,
            stop_pivot_buffer: Micros::new(10_000),
            ladder_step_buffer_pct: 0.005,
            trail_pct: 0.005,
            commission_per_share: Micros::new(5_000),
        }
    }
}
