use serde::{Deserialize, Serialize};

use brk_types::Micros;

/// Parameters for the five exit rules. `no_progress_minutes` is the one
/// spec-flagged open question resolved to a single default (7) that
/// deployments can widen to 8 via configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExitConfig {
    pub no_progress_minutes: i64,
    pub min_progress_per_share: Micros,

    pub resistance_proximity_pct: f64,
    pub resistance_partial_fraction: f64,

    pub stall_window_minutes: i64,
    pub stall_range_pct: f64,
    pub stall_progress_pct: f64,
    pub tight_trail_pct: f64,

    pub eod_flush_minute_of_day: u16,

    pub entry_mid_slippage_bps: i64,
    pub stop_slippage_bps: i64,
}

impl Default for ExitConfig {
    fn default() -> Self {
        ExitConfig {
            no_progress_minutes: 7,
            min_progress_per_share: Micros::new(100_000),
            resistance_proximity_pct: 0.005,
            resistance_partial_fraction: 0.25,
            stall_window_minutes: 5,
            stall_range_pct: 0.002,
            stall_progress_pct: 0.002,
            tight_trail_pct: 0.001,
            eod_flush_minute_of_day: 15 * 60 + 55,
            entry_mid_slippage_bps: 10,
            stop_slippage_bps: 120,
        }
    }
}
