use brk_types::Bar;

use crate::windowed::RollingWindow;

/// ATR(20) on the 5-second sub-bar series. A simple moving average of true
/// range rather than Wilder smoothing — every caller only ever compares
/// ratios against it, so the approximation is sufficient.
#[derive(Debug, Clone)]
pub struct AtrTracker {
    window: RollingWindow,
    prev_close: Option<f64>,
}

impl AtrTracker {
    pub fn new(period: usize) -> Self {
        AtrTracker {
            window: RollingWindow::new(period),
            prev_close: None,
        }
    }

    pub fn push(&mut self, bar: &Bar) -> Option<f64> {
        let high = bar.high.raw() as f64;
        let low = bar.low.raw() as f64;
        let close = bar.close.raw() as f64;

        let tr = match self.prev_close {
            None => high - low,
            Some(prev) => (high - low).max((high - prev).abs()).max((low - prev).abs()),
        };
        self.prev_close = Some(close);
        self.window.push(tr);
        self.window.mean()
    }

    pub fn value(&self) -> Option<f64> {
        self.window.mean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brk_types::Micros;

    fn bar(o: i64, h: i64, l: i64, c: i64) -> Bar {
        Bar {
            ts_epoch: 0,
            minute_of_day: 600,
            open: Micros::from_dollars(o),
            high: Micros::from_dollars(h),
            low: Micros::from_dollars(l),
            close: Micros::from_dollars(c),
            volume: 100,
            vwap_estimate: Micros::from_dollars(c),
            tick_count: 5,
        }
    }

    #[test]
    fn null_until_window_full() {
        let mut atr = AtrTracker::new(3);
        assert_eq!(atr.push(&bar(100, 101, 99, 100)), None);
        assert_eq!(atr.push(&bar(100, 101, 99, 100)), None);
        assert!(atr.push(&bar(100, 101, 99, 100)).is_some());
    }

    #[test]
    fn true_range_uses_prior_close_when_gapping() {
        let mut atr = AtrTracker::new(1);
        atr.push(&bar(100, 101, 100, 100));
        // Gap up open at 110, range 110-109, but true range includes prior close 100.
        let v = atr.push(&bar(110, 111, 109, 110)).unwrap();
        assert_eq!(v, 11.0); // |111 - 100|
    }
}
