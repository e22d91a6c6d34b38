use brk_types::Bar;

use crate::windowed::{linear_regression, Ema, RollingWindow};

const HOUR_SECS: i64 = 3600;

fn hour_bucket(ts_epoch: i64) -> i64 {
    ts_epoch - ts_epoch.rem_euclid(HOUR_SECS)
}

/// Folds a stream of closed 1-minute candles into closed 1-hour candles.
/// Exit-system indicators (§4.6) all run off the hourly series.
#[derive(Debug, Clone)]
pub struct HourlyResampler {
    bucket: Option<i64>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl HourlyResampler {
    pub fn new() -> Self {
        HourlyResampler {
            bucket: None,
            open: 0.0,
            high: 0.0,
            low: 0.0,
            close: 0.0,
        }
    }

    /// Feeds one closed 1-minute candle. Returns the closed hourly close
    /// price the moment the minute candle crosses into a new hour bucket,
    /// `None` otherwise.
    pub fn push(&mut self, candle: &Bar) -> Option<f64> {
        let bucket = hour_bucket(candle.ts_epoch - 1);
        let o = candle.open.raw() as f64;
        let h = candle.high.raw() as f64;
        let l = candle.low.raw() as f64;
        let c = candle.close.raw() as f64;

        match self.bucket {
            None => {
                self.bucket = Some(bucket);
                self.open = o;
                self.high = h;
                self.low = l;
                self.close = c;
                None
            }
            Some(b) if b == bucket => {
                self.high = self.high.max(h);
                self.low = self.low.min(l);
                self.close = c;
                None
            }
            Some(_) => {
                let closed = self.close;
                self.bucket = Some(bucket);
                self.open = o;
                self.high = h;
                self.low = l;
                self.close = c;
                Some(closed)
            }
        }
    }
}

impl Default for HourlyResampler {
    fn default() -> Self {
        Self::new()
    }
}

/// The full suite of hourly-candle indicators consumed by the exit system
/// and the stochastic entry filter: SMA(5,10,20,50,100,200), EMA(9,20,50),
/// Stochastic(14,3,3), Bollinger(20,2σ), and the 30-period linear
/// regression line/slope.
#[derive(Debug, Clone)]
pub struct HourlyIndicatorSuite {
    resampler: HourlyResampler,
    sma5: RollingWindow,
    sma10: RollingWindow,
    sma20: RollingWindow,
    sma50: RollingWindow,
    sma100: RollingWindow,
    sma200: RollingWindow,
    ema9: Ema,
    ema20: Ema,
    ema50: Ema,
    stoch_high: RollingWindow,
    stoch_low: RollingWindow,
    stoch_close: RollingWindow,
    raw_k_history: RollingWindow,
    slow_k_history: RollingWindow,
    bollinger: RollingWindow,
    linreg_window: RollingWindow,
    last_high: f64,
    last_low: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovingAverages {
    pub sma5: Option<f64>,
    pub sma10: Option<f64>,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub sma100: Option<f64>,
    pub sma200: Option<f64>,
    pub ema9: Option<f64>,
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bollinger {
    pub mid: f64,
    pub upper: f64,
    pub lower: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stochastic {
    pub k: f64,
    pub d: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinearRegression {
    pub slope: f64,
    pub value: f64,
}

impl HourlyIndicatorSuite {
    pub fn new() -> Self {
        HourlyIndicatorSuite {
            resampler: HourlyResampler::new(),
            sma5: RollingWindow::new(5),
            sma10: RollingWindow::new(10),
            sma20: RollingWindow::new(20),
            sma50: RollingWindow::new(50),
            sma100: RollingWindow::new(100),
            sma200: RollingWindow::new(200),
            ema9: Ema::new(9),
            ema20: Ema::new(20),
            ema50: Ema::new(50),
            stoch_high: RollingWindow::new(14),
            stoch_low: RollingWindow::new(14),
            stoch_close: RollingWindow::new(14),
            raw_k_history: RollingWindow::new(3),
            slow_k_history: RollingWindow::new(3),
            bollinger: RollingWindow::new(20),
            linreg_window: RollingWindow::new(30),
            last_high: f64::NAN,
            last_low: f64::NAN,
        }
    }

    /// Feeds one closed 1-minute candle. All internal series only advance
    /// on an hourly close; intra-hour candles are absorbed silently.
    pub fn push_minute_candle(&mut self, candle: &Bar) {
        self.last_high = self.last_high.max(candle.high.raw() as f64);
        self.last_low = if self.last_low.is_nan() {
            candle.low.raw() as f64
        } else {
            self.last_low.min(candle.low.raw() as f64)
        };

        if let Some(hourly_close) = self.resampler.push(candle) {
            let hourly_high = std::mem::replace(&mut self.last_high, f64::NAN);
            let hourly_low = std::mem::replace(&mut self.last_low, f64::NAN);
            self.push_hourly_close(hourly_close, hourly_high, hourly_low);
        }
    }

    fn push_hourly_close(&mut self, close: f64, high: f64, low: f64) {
        self.sma5.push(close);
        self.sma10.push(close);
        self.sma20.push(close);
        self.sma50.push(close);
        self.sma100.push(close);
        self.sma200.push(close);
        self.ema9.push(close);
        self.ema20.push(close);
        self.ema50.push(close);
        self.bollinger.push(close);
        self.linreg_window.push(close);

        self.stoch_high.push(high);
        self.stoch_low.push(low);
        self.stoch_close.push(close);
        if let (Some(hh), Some(ll)) = (self.stoch_high.max(), self.stoch_low.min()) {
            let raw_k = if hh > ll { 100.0 * (close - ll) / (hh - ll) } else { 50.0 };
            self.raw_k_history.push(raw_k);
            if let Some(slow_k) = self.raw_k_history.mean() {
                self.slow_k_history.push(slow_k);
            }
        }
    }

    pub fn moving_averages(&self) -> MovingAverages {
        MovingAverages {
            sma5: self.sma5.mean(),
            sma10: self.sma10.mean(),
            sma20: self.sma20.mean(),
            sma50: self.sma50.mean(),
            sma100: self.sma100.mean(),
            sma200: self.sma200.mean(),
            ema9: self.ema9.value(),
            ema20: self.ema20.value(),
            ema50: self.ema50.value(),
        }
    }

    pub fn bollinger(&self) -> Option<Bollinger> {
        let mid = self.bollinger.mean()?;
        let sd = self.bollinger.stddev()?;
        Some(Bollinger {
            mid,
            upper: mid + 2.0 * sd,
            lower: mid - 2.0 * sd,
        })
    }

    pub fn stochastic(&self) -> Option<Stochastic> {
        let k = self.raw_k_history.mean()?;
        let d = self.slow_k_history.mean()?;
        Some(Stochastic { k, d })
    }

    pub fn linear_regression(&self) -> Option<LinearRegression> {
        let (slope, value) = linear_regression(self.linreg_window.values())?;
        Some(LinearRegression { slope, value })
    }
}

impl Default for HourlyIndicatorSuite {
    fn default() -> Self {
        Self::new()
    }
}
