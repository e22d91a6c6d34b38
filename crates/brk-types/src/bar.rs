use serde::{Deserialize, Serialize};

use crate::Micros;

/// A single OHLCV bar at whatever resolution the caller is working at
/// (5-second sub-bar or 1-minute candle). `ts_epoch` is the bar's *close*
/// instant, as seconds since the Unix epoch; it is the engine's one
/// logical clock value for the event this bar represents.
///
/// `minute_of_day` is exchange-local minutes-since-midnight (0..1440),
/// derived once at ingest from the exchange-timezone timestamp in the
/// source file — every time-window rule (entry window, EOD flush) reads
/// this field rather than re-deriving wall-clock time downstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub ts_epoch: i64,
    pub minute_of_day: u16,
    pub open: Micros,
    pub high: Micros,
    pub low: Micros,
    pub close: Micros,
    pub volume: i64,
    pub vwap_estimate: Micros,
    pub tick_count: i64,
}

impl Bar {
    pub fn range(&self) -> Micros {
        self.high - self.low
    }

    /// `|close - open| / open`, in basis points. `None` if `open <= 0`.
    pub fn candle_size_bps(&self) -> Option<i64> {
        (self.close - self.open).abs().pct_of(self.open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open: i64, high: i64, low: i64, close: i64) -> Bar {
        Bar {
            ts_epoch: 0,
            minute_of_day: 600,
            open: Micros::from_dollars(open),
            high: Micros::from_dollars(high),
            low: Micros::from_dollars(low),
            close: Micros::from_dollars(close),
            volume: 1000,
            vwap_estimate: Micros::from_dollars(close),
            tick_count: 10,
        }
    }

    #[test]
    fn candle_size_bps_basic() {
        let b = bar(100, 102, 99, 101);
        // |101-100|/100 = 1% = 100 bps
        assert_eq!(b.candle_size_bps(), Some(100));
    }

    #[test]
    fn range_is_high_minus_low() {
        let b = bar(100, 102, 99, 101);
        assert_eq!(b.range(), Micros::from_dollars(3));
    }
}
