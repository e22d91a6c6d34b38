use brk_types::Micros;

/// `risk_amount = equity × risk_per_trade`; `shares = floor(risk_amount /
/// stop_distance)` clamped to `[min_shares, max_shares]`. Returns `None`
/// when the clamped result still falls short of `min_shares` — callers
/// treat that as a sizing-filter block, not a zero-share position.
pub fn compute_shares(
    equity: Micros,
    risk_per_trade: f64,
    stop_distance: Micros,
    min_shares: i64,
    max_shares: i64,
) -> Option<i64> {
    if stop_distance.raw() <= 0 || !equity.is_positive() {
        return None;
    }

    let risk_amount = (equity.raw() as f64) * risk_per_trade;
    let raw_shares = (risk_amount / stop_distance.raw() as f64).floor() as i64;
    let shares = raw_shares.clamp(0, max_shares);

    if shares < min_shares {
        None
    } else {
        Some(shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_worked_example() {
        // equity 100,000 @ 1% = risk_amount 1,000; stop_distance 0.26 ->
        // floor(1000/0.26) = 3846.
        let equity = Micros::from_dollars(100_000);
        let stop_distance = Micros::new(260_000);
        let shares = compute_shares(equity, 0.01, stop_distance, 1, 10_000).unwrap();
        assert_eq!(shares, 3846);
    }

    #[test]
    fn clips_to_max_shares() {
        let equity = Micros::from_dollars(1_000_000);
        let stop_distance = Micros::new(1_000);
        let shares = compute_shares(equity, 0.01, stop_distance, 1, 500).unwrap();
        assert_eq!(shares, 500);
    }

    #[test]
    fn below_min_shares_blocks() {
        let equity = Micros::from_dollars(100);
        let stop_distance = Micros::from_dollars(10);
        assert_eq!(compute_shares(equity, 0.01, stop_distance, 5, 10_000), None);
    }

    #[test]
    fn non_positive_stop_distance_blocks() {
        let equity = Micros::from_dollars(100_000);
        assert_eq!(compute_shares(equity, 0.01, Micros::ZERO, 1, 100), None);
    }
}
