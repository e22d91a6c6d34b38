use std::collections::VecDeque;

use brk_types::Bar;

use crate::windowed::linear_regression;

/// Coefficients for the bar-shape CVD fallback, used whenever signed tick
/// data is unavailable (always, in backtest mode). Kept as configuration
/// rather than hardcoded, per the open question this leaves unresolved in
/// the source material: the right shape-heuristic weighting is a tuning
/// knob, not a constant.
#[derive(Debug, Clone, Copy)]
pub struct CvdConfig {
    /// Scales the estimated buy/sell skew; 1.0 reproduces the plain
    /// close-position-in-range heuristic.
    pub shape_weight: f64,
}

impl Default for CvdConfig {
    fn default() -> Self {
        CvdConfig { shape_weight: 1.0 }
    }
}

/// Cumulative Volume Delta on the 1-minute candle series. Per candle,
/// estimates `buy_volume - sell_volume` from trade-sign data when
/// available, else from where the close sits within the bar's range.
/// Tracks a running cumulative total and the slope of that total over the
/// last 5 candles.
#[derive(Debug, Clone)]
pub struct CvdTracker {
    config: CvdConfig,
    cumulative: f64,
    recent_cumulative: VecDeque<f64>,
}

impl CvdTracker {
    pub fn new(config: CvdConfig) -> Self {
        CvdTracker {
            config,
            cumulative: 0.0,
            recent_cumulative: VecDeque::with_capacity(5),
        }
    }

    /// Per-candle delta estimated from bar shape: `close` near `high`
    /// skews toward all-buy volume, near `low` skews toward all-sell.
    fn bar_shape_delta(&self, candle: &Bar) -> f64 {
        let high = candle.high.raw() as f64;
        let low = candle.low.raw() as f64;
        let close = candle.close.raw() as f64;
        let volume = candle.volume as f64;
        let range = high - low;
        if range <= 0.0 {
            return 0.0;
        }
        let position = (2.0 * (close - low) - range) / range; // in [-1, 1]
        position * volume * self.config.shape_weight
    }

    /// Feed one closed 1-minute candle, with an optional externally-known
    /// signed volume delta (from tick data). Falls back to the bar-shape
    /// heuristic when `None`.
    pub fn push_minute_candle(&mut self, candle: &Bar, signed_tick_delta: Option<f64>) {
        let delta = signed_tick_delta.unwrap_or_else(|| self.bar_shape_delta(candle));
        self.cumulative += delta;
        self.recent_cumulative.push_back(self.cumulative);
        if self.recent_cumulative.len() > 5 {
            self.recent_cumulative.pop_front();
        }
    }

    pub fn cumulative(&self) -> f64 {
        self.cumulative
    }

    /// Slope of the cumulative CVD over the last 5 candles. `None` until
    /// at least 5 candles have been observed.
    pub fn slope_5(&self) -> Option<f64> {
        if self.recent_cumulative.len() < 5 {
            return None;
        }
        linear_regression(&self.recent_cumulative).map(|(slope, _)| slope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brk_types::Micros;

    fn candle(h: i64, l: i64, c: i64, volume: i64) -> Bar {
        Bar {
            ts_epoch: 0,
            minute_of_day: 600,
            open: Micros::from_dollars(l),
            high: Micros::from_dollars(h),
            low: Micros::from_dollars(l),
            close: Micros::from_dollars(c),
            volume,
            vwap_estimate: Micros::from_dollars(c),
            tick_count: 10,
        }
    }

    #[test]
    fn slope_is_null_before_five_candles() {
        let mut cvd = CvdTracker::new(CvdConfig::default());
        for _ in 0..4 {
            cvd.push_minute_candle(&candle(101, 99, 100, 1000), None);
        }
        assert_eq!(cvd.slope_5(), None);
    }

    #[test]
    fn close_near_high_skews_cumulative_positive() {
        let mut cvd = CvdTracker::new(CvdConfig::default());
        cvd.push_minute_candle(&candle(110, 100, 109, 1000), None);
        assert!(cvd.cumulative() > 0.0);
    }

    #[test]
    fn close_near_low_skews_cumulative_negative() {
        let mut cvd = CvdTracker::new(CvdConfig::default());
        cvd.push_minute_candle(&candle(110, 100, 101, 1000), None);
        assert!(cvd.cumulative() < 0.0);
    }

    #[test]
    fn rising_cumulative_gives_positive_slope() {
        let mut cvd = CvdTracker::new(CvdConfig::default());
        for _ in 0..5 {
            cvd.push_minute_candle(&candle(110, 100, 109, 1000), None);
        }
        assert!(cvd.slope_5().unwrap() > 0.0);
    }

    #[test]
    fn explicit_tick_delta_overrides_shape_heuristic() {
        let mut cvd = CvdTracker::new(CvdConfig::default());
        cvd.push_minute_candle(&candle(110, 100, 101, 1000), Some(500.0));
        assert_eq!(cvd.cumulative(), 500.0);
    }
}
