use brk_portfolio::{CloseReason, Position};
use brk_types::{Bps, Side};

use crate::config::ExitConfig;
use crate::types::{ExitAction, ExitInput};

/// Rule 1: stop hit.
fn stop_hit(cfg: &ExitConfig, position: &Position, input: &ExitInput) -> ExitAction {
    let breached = match position.side {
        Side::Long => input.current_price.raw() <= position.stop_price.raw(),
        Side::Short => input.current_price.raw() >= position.stop_price.raw(),
    };
    if !breached {
        return ExitAction::None;
    }
    ExitAction::ClosePosition {
        reason: CloseReason::Stop,
        exit_price: position.side.slip_exit(position.stop_price, Bps(cfg.stop_slippage_bps)),
    }
}

/// Rule 2: no-progress / time rule. Permanently inactive once any partial
/// has fired.
fn no_progress(cfg: &ExitConfig, position: &Position, input: &ExitInput) -> ExitAction {
    if !position.partials.is_empty() {
        return ExitAction::None;
    }
    let elapsed_minutes = (input.timestamp - position.entry_time) / 60;
    if elapsed_minutes < cfg.no_progress_minutes {
        return ExitAction::None;
    }
    let favorable_excursion = (position.peak_favorable - position.entry_price).saturating_mul(position.side.sign());
    if favorable_excursion.raw() >= cfg.min_progress_per_share.raw() {
        return ExitAction::None;
    }
    ExitAction::ClosePosition {
        reason: CloseReason::TimeRule,
        exit_price: input.mid_price,
    }
}

/// Rule 3: dynamic resistance proximity. Inactive until at least one
/// partial has fired; only evaluated on a closed 1-minute candle.
fn resistance_proximity(cfg: &ExitConfig, position: &Position, input: &ExitInput) -> ExitAction {
    if position.partials.is_empty() || !input.is_candle_close {
        return ExitAction::None;
    }
    let Some(level) = input.next_resistance_level else {
        return ExitAction::None;
    };
    let distance_pct = (level - input.current_price)
        .saturating_mul(position.side.sign())
        .abs()
        .pct_of(input.current_price)
        .map(|bps| bps as f64 / 100.0);
    match distance_pct {
        Some(pct) if pct <= cfg.resistance_proximity_pct * 100.0 => ExitAction::TakePartial {
            fraction: cfg.resistance_partial_fraction,
            price: input.current_price,
        },
        _ => ExitAction::None,
    }
}

/// Rule 4: stall detection on the runner, active once the scanner's
/// `target1` has been reached.
fn stall_detection(cfg: &ExitConfig, position: &Position, input: &ExitInput) -> ExitAction {
    let Some(target1) = position.target1_price else {
        return ExitAction::None;
    };
    let target1_hit = match position.side {
        Side::Long => position.peak_favorable.raw() >= target1.raw(),
        Side::Short => position.peak_favorable.raw() <= target1.raw(),
    };
    if !target1_hit {
        return ExitAction::None;
    }
    let (Some(high), Some(low)) = (input.stall_window_high, input.stall_window_low) else {
        return ExitAction::None;
    };
    let range = high - low;
    let range_floor = Bps::from_percent(cfg.stall_range_pct * 100.0).of(input.current_price);
    if range.raw() >= range_floor.raw() {
        return ExitAction::None;
    }

    let excursion_since_target1 = (position.peak_favorable - target1).saturating_mul(position.side.sign());
    let progress_floor = Bps::from_percent(cfg.stall_progress_pct * 100.0).of(input.current_price);
    if excursion_since_target1.raw() >= progress_floor.raw() {
        return ExitAction::None;
    }

    if (position.trail_pct - cfg.tight_trail_pct).abs() < f64::EPSILON {
        return ExitAction::None;
    }
    ExitAction::TightenTrailing {
        trail_pct: cfg.tight_trail_pct,
    }
}

/// Rule 5: end-of-session flush.
fn eod_flush(cfg: &ExitConfig, input: &ExitInput) -> ExitAction {
    if input.shutdown_requested {
        return ExitAction::ClosePosition {
            reason: CloseReason::Shutdown,
            exit_price: input.mid_price,
        };
    }
    if input.minute_of_day >= cfg.eod_flush_minute_of_day {
        return ExitAction::ClosePosition {
            reason: CloseReason::Eod,
            exit_price: input.mid_price,
        };
    }
    ExitAction::None
}

/// Evaluate the five exit rules in order; the first one that fires wins.
/// Called once per open position per event, after the position manager
/// has applied price updates and before C3 evaluates idle symbols.
pub fn evaluate(cfg: &ExitConfig, position: &Position, input: &ExitInput) -> ExitAction {
    match stop_hit(cfg, position, input) {
        ExitAction::None => {}
        action => return action,
    }
    match no_progress(cfg, position, input) {
        ExitAction::None => {}
        action => return action,
    }
    match resistance_proximity(cfg, position, input) {
        ExitAction::None => {}
        action => return action,
    }
    match stall_detection(cfg, position, input) {
        ExitAction::None => {}
        action => return action,
    }
    eod_flush(cfg, input)
}
