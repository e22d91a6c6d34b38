use serde::{Deserialize, Serialize};

use brk_types::{Micros, Side};

/// Per-symbol, per-pivot breakout confirmation state. Mirrors the states
/// named in the data model exactly; `PULLBACK_RETEST` and
/// `SUSTAINED_BREAK` are not their own variants here because both run
/// concurrently out of `WeakTracking` — the tracker's extra fields record
/// which, if either, is closer to confirming.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakoutState {
    Monitoring,
    BreakoutDetected,
    CandleClosed,
    MomentumConfirmWait,
    WeakTracking,
    CvdMonitoring,
    ReadyToEnter,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakoutType {
    Momentum,
    Pullback,
    Sustained,
    Cvd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailReason {
    CandleNotAbovePivot,
    SubAverageVolume,
    CvdTimeout,
    CvdPriceValidationFailed,
}

/// Configuration mirrors `trading.confirmation.*` exactly. All percentage
/// fields are whole-percent (`1.5` == 1.5%), matching how the spec states
/// its defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BreakoutConfig {
    pub min_volume_threshold: f64,
    pub strong_vol_threshold: f64,
    pub momentum_candle_min_pct: f64,
    pub pullback_tolerance_pct: f64,
    pub retest_vol_threshold: f64,
    pub sustained_minutes: i64,
    pub sustained_tolerance_pct: f64,
    pub cvd_enabled: bool,
    pub strong_cvd_threshold: f64,
    pub min_cvd_threshold: f64,
    pub min_consecutive_aligned: u32,
    pub cvd_max_minutes: i64,
    pub cvd_price_validation_enabled: bool,
    pub max_attempts_per_pivot: u32,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        BreakoutConfig {
            min_volume_threshold: 1.0,
            strong_vol_threshold: 2.0,
            momentum_candle_min_pct: 1.0,
            pullback_tolerance_pct: 0.3,
            retest_vol_threshold: 1.2,
            sustained_minutes: 2,
            sustained_tolerance_pct: 0.3,
            cvd_enabled: true,
            strong_cvd_threshold: 500.0,
            min_cvd_threshold: 100.0,
            min_consecutive_aligned: 2,
            cvd_max_minutes: 10,
            cvd_price_validation_enabled: true,
            max_attempts_per_pivot: 2,
        }
    }
}

/// Persistent per-(symbol, pivot) tracker. Reset to `Monitoring` on
/// `Failed`, on timeout, or after producing a position; `sealed` is
/// sticky for the rest of the session once `attempt` exceeds the cap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BreakoutTracker {
    pub symbol: String,
    pub side: Side,
    pub state: BreakoutState,

    pub first_break_bar: Option<u64>,
    pub candle_close_bar: Option<u64>,

    pub classification: Option<BreakoutType>,
    pub volume_ratio_at_classification: Option<f64>,
    pub candle_size_pct_at_classification: Option<f64>,

    pub pullback_extremum: Option<Micros>,
    pub sustained_hold_origin_bar: Option<u64>,

    pub cvd_monitoring_start_bar: Option<u64>,
    pub cvd_aligned_count: u32,

    pub attempt: u32,
    pub sealed: bool,
}

impl BreakoutTracker {
    pub fn new(symbol: impl Into<String>, side: Side) -> Self {
        BreakoutTracker {
            symbol: symbol.into(),
            side,
            state: BreakoutState::Monitoring,
            first_break_bar: None,
            candle_close_bar: None,
            classification: None,
            volume_ratio_at_classification: None,
            candle_size_pct_at_classification: None,
            pullback_extremum: None,
            sustained_hold_origin_bar: None,
            cvd_monitoring_start_bar: None,
            cvd_aligned_count: 0,
            attempt: 0,
            sealed: false,
        }
    }

    /// Resets all attempt-scoped fields but keeps `symbol`/`side`/`attempt`/
    /// `sealed`, ready to monitor the next breakout off the same pivot.
    pub(crate) fn reset_for_retry(&mut self) {
        self.state = BreakoutState::Monitoring;
        self.first_break_bar = None;
        self.candle_close_bar = None;
        self.classification = None;
        self.volume_ratio_at_classification = None;
        self.candle_size_pct_at_classification = None;
        self.pullback_extremum = None;
        self.sustained_hold_origin_bar = None;
        self.cvd_monitoring_start_bar = None;
        self.cvd_aligned_count = 0;
    }
}
