//! brk-aggregator
//!
//! Tick-to-bar pipeline: turns raw trade prints (live mode) or closed
//! 1-minute historical bars (backtest mode) into a 5-second sub-bar stream
//! and a 1-minute candle stream, each retained in a bounded, absolute-index
//! ring buffer so the rest of the engine can address bar history by count
//! rather than wall-clock offset.

mod aggregator;
mod ring_buffer;

pub use aggregator::{
    split_historical_bar_into_subbars, BarAggregator, BarEvent, Tick,
};
pub use ring_buffer::{RangeError, RingBuffer};

/// Default ring buffer depth per symbol per series (20 minutes of 5-second
/// sub-bars at 1-per-second worst case, and comfortably more than any
/// indicator window's lookback needs in candle terms).
pub const DEFAULT_RING_CAPACITY: usize = 240;
