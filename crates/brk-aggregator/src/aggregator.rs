use brk_types::{Bar, Micros};

use crate::ring_buffer::RingBuffer;

const SUB_BAR_SECS: i64 = 5;
const CANDLE_SECS: i64 = 60;
const SUB_BARS_PER_CANDLE: i64 = CANDLE_SECS / SUB_BAR_SECS;

/// One trade print fed into the aggregator. Only C1 ever sees raw ticks —
/// every other component downstream reads `Bar`s off the ring buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    pub ts_epoch: i64,
    pub minute_of_day: u16,
    pub price: Micros,
    pub size: i64,
}

/// What `BarAggregator::feed` produced for one tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BarEvent {
    /// The tick was absorbed into the in-flight sub-bar; nothing closed.
    None,
    /// A 5-second sub-bar closed. Does not imply a candle also closed.
    SubBar(Bar),
    /// A 1-minute candle closed, carrying every sub-bar that closed inside
    /// it (12 in the common case; fewer across a quote gap).
    Candle(Bar, Vec<Bar>),
}

fn bucket_start(ts_epoch: i64, period_secs: i64) -> i64 {
    ts_epoch - ts_epoch.rem_euclid(period_secs)
}

#[derive(Clone, Debug)]
struct PartialBar {
    bucket_start: i64,
    minute_of_day: u16,
    open: Micros,
    high: Micros,
    low: Micros,
    close: Micros,
    volume: i64,
    vwap_numerator: i128,
    tick_count: i64,
}

impl PartialBar {
    fn start(tick: Tick, bucket_start: i64) -> Self {
        PartialBar {
            bucket_start,
            minute_of_day: tick.minute_of_day,
            open: tick.price,
            high: tick.price,
            low: tick.price,
            close: tick.price,
            volume: tick.size,
            vwap_numerator: tick.price.raw() as i128 * tick.size as i128,
            tick_count: 1,
        }
    }

    fn absorb(&mut self, tick: Tick) {
        self.high = if tick.price > self.high {
            tick.price
        } else {
            self.high
        };
        self.low = if tick.price < self.low {
            tick.price
        } else {
            self.low
        };
        self.close = tick.price;
        self.volume += tick.size;
        self.vwap_numerator += tick.price.raw() as i128 * tick.size as i128;
        self.tick_count += 1;
    }

    fn close_at(&self, period_secs: i64) -> Bar {
        let vwap = if self.volume > 0 {
            Micros::new((self.vwap_numerator / self.volume as i128) as i64)
        } else {
            self.close
        };
        Bar {
            ts_epoch: self.bucket_start + period_secs,
            minute_of_day: self.minute_of_day,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            vwap_estimate: vwap,
            tick_count: self.tick_count,
        }
    }
}

/// Folds a sub-bar into an in-flight 1-minute candle by OHLC composition
/// rather than re-scanning ticks.
fn fold_subbar_into_candle(candle: &mut PartialBar, sub: &Bar) {
    candle.high = if sub.high > candle.high {
        sub.high
    } else {
        candle.high
    };
    candle.low = if sub.low < candle.low {
        sub.low
    } else {
        candle.low
    };
    candle.close = sub.close;
    candle.volume += sub.volume;
    candle.vwap_numerator += sub.vwap_estimate.raw() as i128 * sub.volume as i128;
    candle.tick_count += sub.tick_count;
}

fn candle_start_from_subbar(sub: &Bar, minute_bucket: i64) -> PartialBar {
    PartialBar {
        bucket_start: minute_bucket,
        minute_of_day: sub.minute_of_day,
        open: sub.open,
        high: sub.high,
        low: sub.low,
        close: sub.close,
        volume: sub.volume,
        vwap_numerator: sub.vwap_estimate.raw() as i128 * sub.volume as i128,
        tick_count: sub.tick_count,
    }
}

/// Per-symbol tick-to-bar pipeline: raw ticks in, closed 5-second sub-bars
/// and 1-minute candles out, each retained in a bounded ring buffer indexed
/// by absolute bar count rather than array offset.
pub struct BarAggregator {
    default_ring_capacity: usize,
    partial_subbar: Option<PartialBar>,
    partial_candle: Option<PartialBar>,
    subbars_in_candle: Vec<Bar>,
    pub subbar_history: RingBuffer<Bar>,
    pub candle_history: RingBuffer<Bar>,
}

impl BarAggregator {
    pub fn new(ring_capacity: usize) -> Self {
        BarAggregator {
            default_ring_capacity: ring_capacity,
            partial_subbar: None,
            partial_candle: None,
            subbars_in_candle: Vec::with_capacity(SUB_BARS_PER_CANDLE as usize),
            subbar_history: RingBuffer::new(ring_capacity),
            candle_history: RingBuffer::new(ring_capacity),
        }
    }

    fn ring_capacity(&self) -> usize {
        self.default_ring_capacity
    }

    /// Feeds one live tick. Advances the 5-second sub-bar accumulator and,
    /// when a sub-bar closes, folds it into the in-flight 1-minute candle.
    pub fn feed(&mut self, tick: Tick) -> BarEvent {
        let bucket = bucket_start(tick.ts_epoch, SUB_BAR_SECS);

        let closed_subbar = match &mut self.partial_subbar {
            None => {
                self.partial_subbar = Some(PartialBar::start(tick, bucket));
                None
            }
            Some(p) if p.bucket_start == bucket => {
                p.absorb(tick);
                None
            }
            Some(p) => {
                let closed = p.close_at(SUB_BAR_SECS);
                self.partial_subbar = Some(PartialBar::start(tick, bucket));
                Some(closed)
            }
        };

        let Some(sub) = closed_subbar else {
            return BarEvent::None;
        };

        self.subbar_history.push(sub);
        self.fold_into_candle(sub)
    }

    /// A candle closes the moment its twelfth constituent sub-bar closes,
    /// rather than waiting for the next sub-bar's bucket to roll over — so
    /// a quote gap that delays the next tick never delays the candle.
    fn fold_into_candle(&mut self, sub: Bar) -> BarEvent {
        let minute_bucket = bucket_start(sub.ts_epoch - 1, CANDLE_SECS);

        match &mut self.partial_candle {
            None => {
                self.partial_candle = Some(candle_start_from_subbar(&sub, minute_bucket));
                self.subbars_in_candle.clear();
                self.subbars_in_candle.push(sub);
            }
            Some(c) => {
                fold_subbar_into_candle(c, &sub);
                self.subbars_in_candle.push(sub);
            }
        }

        if self.subbars_in_candle.len() as i64 >= SUB_BARS_PER_CANDLE {
            let candle = self.partial_candle.take().unwrap().close_at(CANDLE_SECS);
            let members = std::mem::take(&mut self.subbars_in_candle);
            self.candle_history.push(candle);
            BarEvent::Candle(candle, members)
        } else {
            BarEvent::SubBar(sub)
        }
    }

    /// Flushes any in-flight sub-bar/candle as final, for end-of-session or
    /// cooperative shutdown. Idempotent: calling it with nothing pending is
    /// a no-op.
    pub fn flush(&mut self) -> BarEvent {
        let Some(p) = self.partial_subbar.take() else {
            return BarEvent::None;
        };
        let sub = p.close_at(SUB_BAR_SECS);
        self.subbar_history.push(sub);
        self.fold_into_candle(sub)
    }
}

/// Backtest-mode replay has only closed 1-minute historical bars, not raw
/// ticks. Splits one historical candle into twelve identical sub-bars, each
/// carrying one-twelfth the candle's volume, so downstream C2/C3 logic that
/// consumes the sub-bar stream runs unmodified in backtest mode.
pub fn split_historical_bar_into_subbars(bar: &Bar) -> [Bar; 12] {
    let per_sub_volume = bar.volume / SUB_BARS_PER_CANDLE;
    let remainder = bar.volume % SUB_BARS_PER_CANDLE;
    let candle_start = bar.ts_epoch - CANDLE_SECS;

    std::array::from_fn(|i| {
        let i = i as i64;
        let volume = per_sub_volume + if i == SUB_BARS_PER_CANDLE - 1 { remainder } else { 0 };
        Bar {
            ts_epoch: candle_start + (i + 1) * SUB_BAR_SECS,
            minute_of_day: bar.minute_of_day,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume,
            vwap_estimate: bar.vwap_estimate,
            tick_count: bar.tick_count / SUB_BARS_PER_CANDLE,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(ts: i64, price: i64, size: i64) -> Tick {
        Tick {
            ts_epoch: ts,
            minute_of_day: 600,
            price: Micros::from_dollars(price),
            size,
        }
    }

    #[test]
    fn first_tick_opens_subbar_without_closing() {
        let mut agg = BarAggregator::new(240);
        assert_eq!(agg.feed(tick(1, 100, 10)), BarEvent::None);
    }

    #[test]
    fn crossing_a_bucket_boundary_closes_a_subbar() {
        let mut agg = BarAggregator::new(240);
        agg.feed(tick(1, 100, 10));
        agg.feed(tick(3, 101, 5));
        let ev = agg.feed(tick(6, 102, 1));
        match ev {
            BarEvent::SubBar(bar) => {
                assert_eq!(bar.ts_epoch, 5);
                assert_eq!(bar.open, Micros::from_dollars(100));
                assert_eq!(bar.close, Micros::from_dollars(101));
                assert_eq!(bar.volume, 15);
            }
            other => panic!("expected SubBar, got {other:?}"),
        }
    }

    #[test]
    fn twelve_subbars_close_a_candle() {
        let mut agg = BarAggregator::new(240);
        let mut last_event = BarEvent::None;
        // 13 ticks five seconds apart drives 12 sub-bar closes and 1 candle close.
        for i in 0..=12 {
            last_event = agg.feed(tick(i * 5 + 1, 100 + i, 1));
        }
        match last_event {
            BarEvent::Candle(candle, members) => {
                assert_eq!(candle.ts_epoch, 60);
                assert_eq!(members.len(), 12);
                assert_eq!(candle.volume, 12);
            }
            other => panic!("expected Candle, got {other:?}"),
        }
    }

    #[test]
    fn flush_closes_in_flight_subbar() {
        let mut agg = BarAggregator::new(240);
        agg.feed(tick(1, 100, 10));
        match agg.flush() {
            BarEvent::SubBar(bar) => assert_eq!(bar.volume, 10),
            other => panic!("expected SubBar on flush, got {other:?}"),
        }
        // second flush is a no-op
        assert_eq!(agg.flush(), BarEvent::None);
    }

    #[test]
    fn split_historical_bar_preserves_total_volume() {
        let bar = Bar {
            ts_epoch: 600,
            minute_of_day: 600,
            open: Micros::from_dollars(100),
            high: Micros::from_dollars(101),
            low: Micros::from_dollars(99),
            close: Micros::from_dollars(100),
            volume: 1201,
            vwap_estimate: Micros::from_dollars(100),
            tick_count: 24,
        };
        let subs = split_historical_bar_into_subbars(&bar);
        assert_eq!(subs.len(), 12);
        let total: i64 = subs.iter().map(|b| b.volume).sum();
        assert_eq!(total, bar.volume);
        assert_eq!(subs[11].ts_epoch, bar.ts_epoch);
        assert_eq!(subs[0].ts_epoch, bar.ts_epoch - 55);
    }

    #[test]
    fn ring_capacity_accessor_matches_constructor() {
        let agg = BarAggregator::new(240);
        assert_eq!(agg.ring_capacity(), 240);
    }
}
