use std::collections::VecDeque;

/// Fixed-window rolling sum/average over `f64` samples. Returns `None`
/// until the window fills once, matching the "null-until-warm" semantics
/// every indicator in this crate shares — callers (filters) must treat
/// `None` as *pass*, never as a block.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    period: usize,
    buf: VecDeque<f64>,
    sum: f64,
}

impl RollingWindow {
    pub fn new(period: usize) -> Self {
        assert!(period > 0);
        RollingWindow {
            period,
            buf: VecDeque::with_capacity(period),
            sum: 0.0,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.buf.push_back(value);
        self.sum += value;
        if self.buf.len() > self.period {
            let evicted = self.buf.pop_front().unwrap();
            self.sum -= evicted;
        }
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.period
    }

    pub fn mean(&self) -> Option<f64> {
        if self.is_full() {
            Some(self.sum / self.period as f64)
        } else {
            None
        }
    }

    pub fn stddev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let var = self.buf.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / self.period as f64;
        Some(var.sqrt())
    }

    pub fn min(&self) -> Option<f64> {
        if self.is_full() {
            self.buf.iter().cloned().fold(None, |acc, v| {
                Some(acc.map_or(v, |m: f64| m.min(v)))
            })
        } else {
            None
        }
    }

    pub fn max(&self) -> Option<f64> {
        if self.is_full() {
            self.buf.iter().cloned().fold(None, |acc, v| {
                Some(acc.map_or(v, |m: f64| m.max(v)))
            })
        } else {
            None
        }
    }

    pub fn values(&self) -> &VecDeque<f64> {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Exponential moving average. `None` until `period` samples have been
/// seen at least once (seeded from their simple average).
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alpha: f64,
    seed: RollingWindow,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Ema {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            seed: RollingWindow::new(period),
            value: None,
        }
    }

    pub fn push(&mut self, sample: f64) -> Option<f64> {
        match self.value {
            Some(prev) => {
                let next = self.alpha * sample + (1.0 - self.alpha) * prev;
                self.value = Some(next);
                Some(next)
            }
            None => {
                self.seed.push(sample);
                if let Some(mean) = self.seed.mean() {
                    self.value = Some(mean);
                }
                self.value
            }
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Least-squares linear regression over the most recent `period` samples,
/// indexed 0..period-1 on the x-axis (x = 0 is the oldest sample in the
/// window). Returns `(slope, fitted_value_at_latest_x)`.
pub fn linear_regression(samples: &VecDeque<f64>) -> Option<(f64, f64)> {
    let n = samples.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let x_mean = xs.iter().sum::<f64>() / n_f;
    let y_mean = samples.iter().sum::<f64>() / n_f;

    let mut cov = 0.0;
    let mut var = 0.0;
    for (x, y) in xs.iter().zip(samples.iter()) {
        cov += (x - x_mean) * (y - y_mean);
        var += (x - x_mean).powi(2);
    }
    if var == 0.0 {
        return None;
    }
    let slope = cov / var;
    let intercept = y_mean - slope * x_mean;
    let fitted_at_latest = intercept + slope * (n_f - 1.0);
    Some((slope, fitted_at_latest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_window_is_null_until_full() {
        let mut w = RollingWindow::new(3);
        w.push(1.0);
        w.push(2.0);
        assert_eq!(w.mean(), None);
        w.push(3.0);
        assert_eq!(w.mean(), Some(2.0));
    }

    #[test]
    fn rolling_window_evicts_oldest() {
        let mut w = RollingWindow::new(2);
        w.push(1.0);
        w.push(2.0);
        w.push(10.0);
        assert_eq!(w.mean(), Some(6.0));
    }

    #[test]
    fn ema_seeds_from_simple_average_then_exponential() {
        let mut e = Ema::new(3);
        e.push(1.0);
        e.push(2.0);
        assert_eq!(e.value(), None);
        let seeded = e.push(3.0).unwrap();
        assert!((seeded - 2.0).abs() < 1e-9);
        let next = e.push(6.0).unwrap();
        assert!(next > seeded);
    }

    #[test]
    fn linear_regression_of_straight_line_has_unit_slope() {
        let samples: VecDeque<f64> = [1.0, 2.0, 3.0, 4.0].into_iter().collect();
        let (slope, fitted) = linear_regression(&samples).unwrap();
        assert!((slope - 1.0).abs() < 1e-9);
        assert!((fitted - 4.0).abs() < 1e-9);
    }

    #[test]
    fn linear_regression_needs_at_least_two_points() {
        let samples: VecDeque<f64> = [1.0].into_iter().collect();
        assert_eq!(linear_regression(&samples), None);
    }
}
