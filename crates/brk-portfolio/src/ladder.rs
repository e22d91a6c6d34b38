use brk_types::{Micros, Side};

fn is_favorable(side: Side, entry: Micros, candidate: Micros) -> bool {
    match side {
        Side::Long => candidate.raw() > entry.raw(),
        Side::Short => candidate.raw() < entry.raw(),
    }
}

/// The traditional ladder: 1R, 2R, then scanner `target1`/`target2` when
/// present and still ahead of entry. Deduplicated and sorted in the
/// favorable direction.
pub fn build_ladder(
    side: Side,
    entry: Micros,
    stop_distance: Micros,
    target1: Option<Micros>,
    target2: Option<Micros>,
) -> Vec<Micros> {
    let sign = side.sign();
    let one_r = entry + stop_distance.saturating_mul(sign);
    let two_r = entry + stop_distance.saturating_mul(2 * sign);

    let mut levels: Vec<Micros> = vec![one_r, two_r];
    for t in [target1, target2].into_iter().flatten() {
        if is_favorable(side, entry, t) {
            levels.push(t);
        }
    }

    levels.sort_by_key(|m| m.raw());
    levels.dedup();
    if side == Side::Short {
        levels.reverse();
    }
    levels
}

/// Default fraction-per-level schedule: 50/25/25 for a three-level ladder,
/// an even quarter for a four-level ladder, uniform otherwise.
pub fn fractions_for_ladder(len: usize) -> Vec<f64> {
    match len {
        0 => Vec::new(),
        3 => vec![0.5, 0.25, 0.25],
        4 => vec![0.25, 0.25, 0.25, 0.25],
        n => vec![1.0 / n as f64; n],
    }
}
