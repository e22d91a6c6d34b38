//! Fixed-point money type.
//!
//! All prices and cash amounts in this workspace use a 1e-6 (micros)
//! fixed-point representation stored as `i64`, never `f64`. Backtest and
//! live replay must produce bit-identical decisions (see the scheduler's
//! determinism property); float accumulation across a session does not
//! give that guarantee, integer micros does.
//!
//! 1 USD = `Micros(1_000_000)`.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// 1e-6 fixed-point scale.
pub const MICROS_SCALE: i64 = 1_000_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Micros(i64);

impl Micros {
    pub const ZERO: Micros = Micros(0);
    pub const MAX: Micros = Micros(i64::MAX);
    pub const MIN: Micros = Micros(i64::MIN);

    #[inline]
    pub const fn new(raw: i64) -> Self {
        Micros(raw)
    }

    /// Construct from a whole-dollar integer amount (no fractional cents).
    #[inline]
    pub const fn from_dollars(dollars: i64) -> Self {
        Micros(dollars * MICROS_SCALE)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn saturating_add(self, rhs: Micros) -> Micros {
        Micros(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub fn saturating_sub(self, rhs: Micros) -> Micros {
        Micros(self.0.saturating_sub(rhs.0))
    }

    #[inline]
    pub fn saturating_mul(self, rhs: i64) -> Micros {
        Micros(self.0.saturating_mul(rhs))
    }

    #[inline]
    pub fn abs(self) -> Micros {
        Micros(self.0.saturating_abs())
    }

    #[inline]
    pub fn signum(self) -> i64 {
        self.0.signum()
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub fn is_non_negative(self) -> bool {
        self.0 >= 0
    }

    /// Multiply a per-unit price by an integer share quantity.
    ///
    /// Returns `None` on overflow; callers must handle it explicitly rather
    /// than silently clamping a trade notional.
    #[inline]
    pub fn checked_mul_qty(self, qty: i64) -> Option<Micros> {
        self.0.checked_mul(qty).map(Micros)
    }

    /// `self` expressed as a percentage-of-`base` difference, in basis
    /// points (1 bp = 0.01%). Returns `None` if `base` is non-positive.
    pub fn pct_of(self, base: Micros) -> Option<i64> {
        if base.0 <= 0 {
            return None;
        }
        let num = (self.0 as i128) * 10_000i128;
        Some((num / base.0 as i128) as i64)
    }
}

impl Add for Micros {
    type Output = Micros;
    #[inline]
    fn add(self, rhs: Micros) -> Micros {
        Micros(self.0 + rhs.0)
    }
}

impl Sub for Micros {
    type Output = Micros;
    #[inline]
    fn sub(self, rhs: Micros) -> Micros {
        Micros(self.0 - rhs.0)
    }
}

impl Neg for Micros {
    type Output = Micros;
    #[inline]
    fn neg(self) -> Micros {
        Micros(-self.0)
    }
}

impl AddAssign for Micros {
    #[inline]
    fn add_assign(&mut self, rhs: Micros) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Micros {
    #[inline]
    fn sub_assign(&mut self, rhs: Micros) {
        self.0 -= rhs.0;
    }
}

impl std::fmt::Display for Micros {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dollars = self.0 / MICROS_SCALE;
        let frac = (self.0 % MICROS_SCALE).abs();
        if self.0 < 0 && dollars == 0 {
            write!(f, "-{dollars}.{frac:06}")
        } else {
            write!(f, "{dollars}.{frac:06}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sub_roundtrip() {
        let a = Micros::new(100_000_000);
        let b = Micros::new(25_000_000);
        assert_eq!((a + b) - b, a);
    }

    #[test]
    fn saturating_add_clamps() {
        assert_eq!(Micros::MAX.saturating_add(Micros::new(1)), Micros::MAX);
    }

    #[test]
    fn checked_mul_qty_overflow_is_none() {
        assert_eq!(Micros::MAX.checked_mul_qty(2), None);
    }

    #[test]
    fn pct_of_basic() {
        let a = Micros::from_dollars(1);
        let base = Micros::from_dollars(100);
        assert_eq!(a.pct_of(base), Some(100)); // 1% = 100 bps
    }

    #[test]
    fn pct_of_non_positive_base_is_none() {
        assert_eq!(Micros::from_dollars(1).pct_of(Micros::ZERO), None);
    }

    #[test]
    fn display_six_decimals() {
        assert_eq!(format!("{}", Micros::new(1_500_000)), "1.500000");
        assert_eq!(format!("{}", Micros::new(-2_750_000)), "-2.750000");
    }
}
