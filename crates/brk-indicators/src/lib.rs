//! brk-indicators
//!
//! Deterministic rolling indicators over the aggregator's bar streams: ATR
//! on the 5-second series, trailing average volume over completed 1-minute
//! candles, an hourly-resampled suite (SMA/EMA/Stochastic/Bollinger/linear
//! regression), and cumulative volume delta. Every indicator returns
//! `None` rather than a placeholder value until its window has seen enough
//! history — callers that gate on a `None` must treat it as *pass*.

mod atr;
mod cvd;
mod hourly;
mod volume;
mod windowed;

pub use atr::AtrTracker;
pub use cvd::{CvdConfig, CvdTracker};
pub use hourly::{
    Bollinger, HourlyIndicatorSuite, HourlyResampler, LinearRegression, MovingAverages,
    Stochastic,
};
pub use volume::AvgVolumeTracker;
pub use windowed::{linear_regression, Ema, RollingWindow};
