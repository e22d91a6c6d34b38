use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Bps, Micros};

/// Position / setup direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for LONG, -1 for SHORT. Used to fold price-comparison direction
    /// into a single arithmetic expression instead of branching everywhere
    /// (e.g. `entry + side.sign() * distance` covers both directions of 1R).
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Side::Long => 1,
            Side::Short => -1,
        }
    }

    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    /// Fill price for a trade that opens or adds to a position on this
    /// side (buy for LONG, sell for SHORT): slippage always moves the
    /// fill against the trader, i.e. higher for LONG, lower for SHORT.
    #[inline]
    pub fn slip_entry(self, price: Micros, bps: Bps) -> Micros {
        price + bps.of(price).saturating_mul(self.sign())
    }

    /// Fill price for a trade that reduces or closes a position on this
    /// side (sell for LONG, buy-to-cover for SHORT): slippage moves the
    /// fill against the trader, i.e. lower for LONG, higher for SHORT.
    #[inline]
    pub fn slip_exit(self, price: Micros, bps: Bps) -> Micros {
        price - bps.of(price).saturating_mul(self.sign())
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// What a scanner Setup is biased toward. A setup may offer both directions
/// (e.g. a symbol that prints both a resistance and a support pivot).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideHint {
    LongBiased,
    ShortBiased,
    Both,
}

impl SideHint {
    pub fn allows(self, side: Side) -> bool {
        matches!(
            (self, side),
            (SideHint::Both, _)
                | (SideHint::LongBiased, Side::Long)
                | (SideHint::ShortBiased, Side::Short)
        )
    }
}
