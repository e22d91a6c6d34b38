use crate::windowed::RollingWindow;

/// Trailing mean volume over the last 20 *completed* 1-minute candles.
///
/// The source this was distilled from uses a trailing mean rather than a
/// time-of-day average across prior sessions; that is kept here as the
/// default, with the time-of-day variant left as a configuration
/// extension point rather than implemented speculatively.
#[derive(Debug, Clone)]
pub struct AvgVolumeTracker {
    window: RollingWindow,
}

impl AvgVolumeTracker {
    pub fn new(period: usize) -> Self {
        AvgVolumeTracker {
            window: RollingWindow::new(period),
        }
    }

    /// Call once per completed 1-minute candle, in candle-close order.
    pub fn push_completed_candle(&mut self, volume: i64) {
        self.window.push(volume as f64);
    }

    pub fn average(&self) -> Option<f64> {
        self.window.mean()
    }

    /// `current_candle_volume / average`. `None` while the window is not
    /// yet full — filters must treat this as pass, never block.
    pub fn volume_ratio(&self, current_candle_volume: i64) -> Option<f64> {
        let avg = self.average()?;
        if avg <= 0.0 {
            return None;
        }
        Some(current_candle_volume as f64 / avg)
    }
}
