//! Basis-point ratio type.
//!
//! Percentages used throughout the filter/exit rules (gap %, room-to-run %,
//! candle-size %, stall range %, trail %) are represented as integer basis
//! points (1 bp = 0.01%) rather than `f64`, for the same determinism reason
//! [`crate::Micros`] exists. `Bps` composes cleanly with `Micros` via
//! [`Micros::pct_of`] and [`Bps::of`].

use serde::{Deserialize, Serialize};

use crate::Micros;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Bps(pub i64);

impl Bps {
    pub const ZERO: Bps = Bps(0);

    /// Construct from a whole-percent value (e.g. `Bps::from_percent(1.5)` == 150 bps).
    /// Rounds to the nearest basis point.
    pub fn from_percent(pct: f64) -> Self {
        Bps((pct * 100.0).round() as i64)
    }

    pub fn as_percent(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// `base * self / 10_000`, rounded toward zero.
    pub fn of(self, base: Micros) -> Micros {
        let v = (base.raw() as i128 * self.0 as i128) / 10_000i128;
        Micros::new(v.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_percent_rounds() {
        assert_eq!(Bps::from_percent(1.0), Bps(100));
        assert_eq!(Bps::from_percent(0.3), Bps(30));
        assert_eq!(Bps::from_percent(1.5), Bps(150));
    }

    #[test]
    fn of_computes_fraction() {
        let base = Micros::from_dollars(200);
        assert_eq!(Bps::from_percent(0.5).of(base), Micros::from_dollars(1));
    }
}
