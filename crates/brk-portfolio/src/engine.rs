use brk_breakout::BreakoutType;
use brk_types::{Micros, Side};

use crate::config::PositionConfig;
use crate::ladder::{build_ladder, fractions_for_ladder};
use crate::sizing::compute_shares;
use crate::types::{ClosedPosition, CloseReason, Partial, PartialReason, Position};

fn mul_qty_price_micros(qty: i64, price_micros: i64) -> i128 {
    (qty as i128) * (price_micros as i128)
}

fn i128_to_i64_clamp(x: i128) -> i64 {
    if x > i64::MAX as i128 {
        i64::MAX
    } else if x < i64::MIN as i128 {
        i64::MIN
    } else {
        x as i64
    }
}

/// `(exit - entry) × side × shares - commission`, saturating through i128
/// the way the ledger accounting does.
fn pnl_for_leg(
    entry: Micros,
    exit: Micros,
    side: Side,
    shares: i64,
    commission_per_share: Micros,
) -> Micros {
    let diff = (exit - entry).saturating_mul(side.sign());
    let gross = i128_to_i64_clamp(mul_qty_price_micros(shares, diff.raw()));
    let commission = i128_to_i64_clamp(mul_qty_price_micros(shares, commission_per_share.raw()));
    Micros::new(gross).saturating_sub(Micros::new(commission))
}

/// Open a new position. Returns `None` if the sizing filter blocks the
/// entry (clamped shares below `min_shares`) — the caller never sees a
/// zero-share position.
#[allow(clippy::too_many_arguments)]
pub fn open(
    cfg: &PositionConfig,
    symbol: impl Into<String>,
    side: Side,
    pivot: Micros,
    entry_price: Micros,
    entry_time: i64,
    account_equity: Micros,
    target1: Option<Micros>,
    target2: Option<Micros>,
    breakout_type: BreakoutType,
) -> Option<Position> {
    let stop_price = pivot - cfg.stop_pivot_buffer.saturating_mul(side.sign());
    let stop_distance = (entry_price - stop_price).abs();

    let shares = compute_shares(
        account_equity,
        cfg.risk_per_trade,
        stop_distance,
        cfg.min_shares,
        cfg.max_shares,
    )?;

    let partial_targets = build_ladder(side, entry_price, stop_distance, target1, target2);
    let partial_fractions = fractions_for_ladder(partial_targets.len());

    Some(Position {
        symbol: symbol.into(),
        side,
        entry_price,
        entry_time,
        initial_shares: shares,
        remaining_shares: shares,
        partials: Vec::new(),
        stop_price,
        partial_targets,
        partial_fractions,
        ladder_head: 0,
        pivot,
        peak_favorable: entry_price,
        trough_adverse: entry_price,
        breakout_type,
        target1_price: target1,
        trailing_active: false,
        trail_pct: cfg.trail_pct,
        stall_window_origin: None,
        stall_armed: false,
    })
}

/// Update the position's favorable/adverse excursion bookkeeping and, once
/// the runner's trailing stop is active, advance it. Called on every
/// price print; never fires a partial or a close by itself.
pub fn mark(position: &mut Position, current_price: Micros) {
    match position.side {
        Side::Long => {
            if current_price.raw() > position.peak_favorable.raw() {
                position.peak_favorable = current_price;
            }
            if current_price.raw() < position.trough_adverse.raw() {
                position.trough_adverse = current_price;
            }
        }
        Side::Short => {
            if current_price.raw() < position.peak_favorable.raw() {
                position.peak_favorable = current_price;
            }
            if current_price.raw() > position.trough_adverse.raw() {
                position.trough_adverse = current_price;
            }
        }
    }

    if position.trailing_active {
        let trail_distance = (position.peak_favorable.raw() as f64 * position.trail_pct) as i64;
        let candidate = position.peak_favorable - Micros::new(trail_distance).saturating_mul(position.side.sign());
        advance_stop(position, candidate);
    }
}

/// Stops are monotonic: only move in the favorable direction, never
/// adverse.
fn advance_stop(position: &mut Position, candidate: Micros) {
    let improves = match position.side {
        Side::Long => candidate.raw() > position.stop_price.raw(),
        Side::Short => candidate.raw() < position.stop_price.raw(),
    };
    if improves {
        position.stop_price = candidate;
    }
}

/// Evaluate the head of the partial ladder against the current price. On a
/// fill, records the partial, advances the stop (breakeven on the first
/// partial, ladder-level-minus-buffer thereafter), and arms trailing once
/// the ladder is exhausted.
pub fn evaluate_ladder(
    cfg: &PositionConfig,
    position: &mut Position,
    current_price: Micros,
    timestamp: i64,
) -> Option<Partial> {
    if position.ladder_head >= position.partial_targets.len() {
        return None;
    }

    let level = position.partial_targets[position.ladder_head];
    let crossed = match position.side {
        Side::Long => current_price.raw() >= level.raw(),
        Side::Short => current_price.raw() <= level.raw(),
    };
    if !crossed {
        return None;
    }

    let fraction = position.partial_fractions[position.ladder_head];
    let raw_shares = (position.initial_shares as f64 * fraction).round() as i64;
    let shares = raw_shares.min(position.remaining_shares).max(0);
    if shares == 0 {
        position.ladder_head += 1;
        return None;
    }

    let pnl = pnl_for_leg(
        position.entry_price,
        current_price,
        position.side,
        shares,
        cfg.commission_per_share,
    );

    position.remaining_shares -= shares;
    let partial = Partial {
        timestamp,
        price: current_price,
        shares,
        reason: PartialReason::Ladder,
        pnl_micros: pnl,
    };
    position.partials.push(partial.clone());

    if position.stall_window_origin.is_none() {
        position.stall_window_origin = Some(timestamp);
    }

    if position.ladder_head == 0 {
        advance_stop(position, position.entry_price);
    } else {
        let prev_level = position.partial_targets[position.ladder_head - 1];
        let buffer = Micros::new((prev_level.raw() as f64 * cfg.ladder_step_buffer_pct) as i64);
        let candidate = prev_level - buffer.saturating_mul(position.side.sign());
        advance_stop(position, candidate);
    }

    position.ladder_head += 1;
    if position.ladder_head >= position.partial_targets.len() {
        position.trailing_active = true;
    }

    Some(partial)
}

/// Take an out-of-ladder partial (the exit policy's resistance-proximity
/// rule), tightening the stop to the last ladder level hit.
pub fn take_resistance_partial(
    cfg: &PositionConfig,
    position: &mut Position,
    current_price: Micros,
    timestamp: i64,
    fraction: f64,
) -> Option<Partial> {
    if position.remaining_shares <= 0 {
        return None;
    }
    let shares = ((position.initial_shares as f64 * fraction).round() as i64)
        .min(position.remaining_shares)
        .max(0);
    if shares == 0 {
        return None;
    }

    let pnl = pnl_for_leg(
        position.entry_price,
        current_price,
        position.side,
        shares,
        cfg.commission_per_share,
    );
    position.remaining_shares -= shares;
    let partial = Partial {
        timestamp,
        price: current_price,
        shares,
        reason: PartialReason::ResistanceProximity,
        pnl_micros: pnl,
    };
    position.partials.push(partial.clone());

    if let Some(&last_level) = position.partial_targets.get(position.ladder_head.saturating_sub(1)) {
        advance_stop(position, last_level);
    }

    Some(partial)
}

/// Tighten the trailing buffer (the stall-detection rule). The new buffer
/// only takes effect on the next `mark`.
pub fn tighten_trailing(position: &mut Position, tight_trail_pct: f64) {
    position.trail_pct = tight_trail_pct;
}

/// Close the remaining fraction at `exit_price`, producing the terminal
/// accounting record.
pub fn close(
    cfg: &PositionConfig,
    position: &Position,
    exit_price: Micros,
    exit_time: i64,
    reason: CloseReason,
) -> ClosedPosition {
    let shares = position.remaining_shares;
    let pnl = pnl_for_leg(
        position.entry_price,
        exit_price,
        position.side,
        shares,
        cfg.commission_per_share,
    );
    ClosedPosition {
        symbol: position.symbol.clone(),
        side: position.side,
        entry_price: position.entry_price,
        exit_price,
        exit_time,
        reason,
        shares_closed: shares,
        pnl_micros: pnl,
    }
}
