use serde::{Deserialize, Serialize};

use crate::{Micros, SideHint};

/// An immutable scanner watchlist entry for one (symbol, trading day).
///
/// Read-only for the engine's lifetime of one trading day. The engine
/// never mutates a `Setup`; attempt counters and sealing live on the
/// breakout tracker keyed by `(symbol, pivot)`, not here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setup {
    pub symbol: String,
    pub side_hint: SideHint,

    /// Long pivot (resistance level whose break triggers a LONG attempt).
    pub resistance: Option<Micros>,
    /// Short pivot (support level whose break triggers a SHORT attempt).
    pub support: Option<Micros>,

    pub target1: Option<Micros>,
    pub target2: Option<Micros>,
    pub target3: Option<Micros>,

    pub downside1: Option<Micros>,
    pub downside2: Option<Micros>,

    pub score: i64,
    /// Basis points; pivot width as a fraction of price.
    pub pivot_width_bps: i64,
    pub test_count: i64,
    pub prev_close: Micros,

    /// Pre-computed reward/risk ratio, scaled by 100 (e.g. 250 == 2.50:1).
    pub risk_reward_x100: i64,
}

impl Setup {
    /// The pivot level that a given side breaks through. `None` if the
    /// setup does not offer that side (e.g. a long-only setup has no
    /// `support` pivot configured for a SHORT attempt).
    pub fn pivot(&self, side: crate::Side) -> Option<Micros> {
        match side {
            crate::Side::Long => self.resistance,
            crate::Side::Short => self.support,
        }
    }

    /// Target ladder in the favorable direction for `side`, nearest-first,
    /// skipping unset levels.
    pub fn scanner_targets(&self, side: crate::Side) -> Vec<Micros> {
        match side {
            crate::Side::Long => [self.target1, self.target2, self.target3]
                .into_iter()
                .flatten()
                .collect(),
            crate::Side::Short => [self.downside1, self.downside2]
                .into_iter()
                .flatten()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Setup {
        Setup {
            symbol: "T".into(),
            side_hint: SideHint::Both,
            resistance: Some(Micros::from_dollars(100)),
            support: Some(Micros::from_dollars(95)),
            target1: Some(Micros::from_dollars(101)),
            target2: None,
            target3: None,
            downside1: Some(Micros::from_dollars(94)),
            downside2: None,
            score: 70,
            pivot_width_bps: 50,
            test_count: 2,
            prev_close: Micros::from_dollars(99),
            risk_reward_x100: 250,
        }
    }

    #[test]
    fn pivot_picks_side() {
        let s = setup();
        assert_eq!(s.pivot(crate::Side::Long), s.resistance);
        assert_eq!(s.pivot(crate::Side::Short), s.support);
    }

    #[test]
    fn scanner_targets_skip_unset() {
        let s = setup();
        assert_eq!(s.scanner_targets(crate::Side::Long), vec![s.target1.unwrap()]);
        assert_eq!(
            s.scanner_targets(crate::Side::Short),
            vec![s.downside1.unwrap()]
        );
    }
}
