use brk_types::{Micros, Side};

use crate::types::{BreakoutConfig, BreakoutState, BreakoutTracker, BreakoutType, FailReason};

/// One bar-level event the scheduler hands to the tracker. Every derived
/// quantity (volume ratio, candle size, CVD slope) is computed upstream by
/// `brk-indicators` and passed in here — the state machine only ever reads
/// snapshots, never reaches back into indicator state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BreakoutEvent {
    SubBarClose {
        bar_index: u64,
        price: Micros,
        /// Volume ratio measured over the retest window; only meaningful
        /// while tracking a pullback.
        retest_volume_ratio: Option<f64>,
    },
    CandleClose {
        bar_index: u64,
        close: Micros,
        volume_ratio: Option<f64>,
        candle_size_pct: Option<f64>,
        cvd_slope: Option<f64>,
        /// Nearest still-ahead target, used for CVD price validation.
        first_target: Option<Micros>,
    },
}

impl BreakoutEvent {
    pub fn bar_index(&self) -> u64 {
        match self {
            BreakoutEvent::SubBarClose { bar_index, .. } => *bar_index,
            BreakoutEvent::CandleClose { bar_index, .. } => *bar_index,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BreakoutOutcome {
    NoChange,
    Failed(FailReason),
    ReadyToEnter(BreakoutType),
    /// The tracker was already sealed; the event was ignored.
    Sealed,
    /// The event referenced bar history that has since been evicted from
    /// the ring buffer; treated as a no-op, never a panic.
    Evicted,
}

fn is_through_pivot(side: Side, price: Micros, pivot: Micros) -> bool {
    match side {
        Side::Long => price > pivot,
        Side::Short => price < pivot,
    }
}

fn pct_distance(price: Micros, pivot: Micros) -> f64 {
    if pivot.raw() == 0 {
        return f64::INFINITY;
    }
    ((price.raw() - pivot.raw()).abs() as f64 / pivot.raw() as f64) * 100.0
}

fn cvd_price_validation(side: Side, price: Micros, pivot: Micros, first_target: Option<Micros>) -> bool {
    if !is_through_pivot(side, price, pivot) {
        return false;
    }
    match first_target {
        None => true,
        Some(target) => match side {
            Side::Long => price < target,
            Side::Short => price > target,
        },
    }
}

/// Returns `Momentum` when both thresholds are met (inclusive, per the
/// boundary-exactness property), else `Weak`-as-`Pullback`-provenance is
/// wrong — callers use `classify_weak_or_momentum` instead.
fn classify_weak_or_momentum(
    cfg: &BreakoutConfig,
    volume_ratio: Option<f64>,
    candle_size_pct: Option<f64>,
) -> WeakOrMomentum {
    match (volume_ratio, candle_size_pct) {
        (Some(vr), Some(cs)) if vr >= cfg.strong_vol_threshold && cs >= cfg.momentum_candle_min_pct => {
            WeakOrMomentum::Momentum
        }
        _ => WeakOrMomentum::Weak,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WeakOrMomentum {
    Momentum,
    Weak,
}

/// Pure, deterministic confirmation step: given the current tracker state
/// and one bar event, computes the next state (mutating `tracker` in
/// place) and returns the decision the scheduler acts on.
pub fn evaluate(
    cfg: &BreakoutConfig,
    tracker: &mut BreakoutTracker,
    pivot: Micros,
    event: BreakoutEvent,
) -> BreakoutOutcome {
    if tracker.sealed {
        return BreakoutOutcome::Sealed;
    }
    let side = tracker.side;

    match tracker.state {
        BreakoutState::Monitoring => match event {
            BreakoutEvent::SubBarClose { bar_index, price, .. } => {
                if is_through_pivot(side, price, pivot) {
                    tracker.first_break_bar = Some(bar_index);
                    tracker.state = BreakoutState::BreakoutDetected;
                }
                BreakoutOutcome::NoChange
            }
            BreakoutEvent::CandleClose { .. } => BreakoutOutcome::NoChange,
        },

        BreakoutState::BreakoutDetected => match event {
            BreakoutEvent::CandleClose { bar_index, close, .. } => {
                if !is_through_pivot(side, close, pivot) {
                    tracker.reset_for_retry();
                    return BreakoutOutcome::Failed(FailReason::CandleNotAbovePivot);
                }
                tracker.candle_close_bar = Some(bar_index);
                tracker.state = BreakoutState::CandleClosed;
                // Immediately classify: CandleClosed is a same-event fallthrough.
                classify_at_candle_closed(cfg, tracker, side, pivot, event)
            }
            BreakoutEvent::SubBarClose { .. } => BreakoutOutcome::NoChange,
        },

        BreakoutState::CandleClosed => classify_at_candle_closed(cfg, tracker, side, pivot, event),

        BreakoutState::MomentumConfirmWait => {
            tracker.state = BreakoutState::ReadyToEnter;
            BreakoutOutcome::ReadyToEnter(BreakoutType::Momentum)
        }

        BreakoutState::WeakTracking => evaluate_weak_tracking(cfg, tracker, side, pivot, event),

        BreakoutState::CvdMonitoring => evaluate_cvd_monitoring(cfg, tracker, side, pivot, event),

        BreakoutState::ReadyToEnter | BreakoutState::Failed => BreakoutOutcome::NoChange,
    }
}

fn classify_at_candle_closed(
    cfg: &BreakoutConfig,
    tracker: &mut BreakoutTracker,
    _side: Side,
    _pivot: Micros,
    event: BreakoutEvent,
) -> BreakoutOutcome {
    let BreakoutEvent::CandleClose {
        bar_index,
        volume_ratio,
        candle_size_pct,
        ..
    } = event
    else {
        return BreakoutOutcome::NoChange;
    };

    if let Some(vr) = volume_ratio {
        if vr < cfg.min_volume_threshold {
            tracker.reset_for_retry();
            return BreakoutOutcome::Failed(FailReason::SubAverageVolume);
        }
    }

    let classification = classify_weak_or_momentum(cfg, volume_ratio, candle_size_pct);
    tracker.volume_ratio_at_classification = volume_ratio;
    tracker.candle_size_pct_at_classification = candle_size_pct;
    tracker.classification = Some(match classification {
        WeakOrMomentum::Momentum => BreakoutType::Momentum,
        WeakOrMomentum::Weak => BreakoutType::Pullback, // provenance finalized only at entry
    });

    if cfg.cvd_enabled {
        tracker.state = BreakoutState::CvdMonitoring;
        tracker.cvd_monitoring_start_bar = Some(bar_index);
        tracker.cvd_aligned_count = 0;
    } else {
        match classification {
            WeakOrMomentum::Momentum => tracker.state = BreakoutState::MomentumConfirmWait,
            WeakOrMomentum::Weak => {
                tracker.state = BreakoutState::WeakTracking;
                tracker.sustained_hold_origin_bar = Some(bar_index);
            }
        }
    }
    BreakoutOutcome::NoChange
}

fn evaluate_weak_tracking(
    cfg: &BreakoutConfig,
    tracker: &mut BreakoutTracker,
    side: Side,
    pivot: Micros,
    event: BreakoutEvent,
) -> BreakoutOutcome {
    match event {
        BreakoutEvent::SubBarClose {
            price,
            retest_volume_ratio,
            ..
        } => {
            tracker.pullback_extremum = Some(match (tracker.pullback_extremum, side) {
                (None, _) => price,
                (Some(extremum), Side::Long) => extremum.min(price),
                (Some(extremum), Side::Short) => extremum.max(price),
            });

            let near_pivot = pct_distance(tracker.pullback_extremum.unwrap(), pivot) <= cfg.pullback_tolerance_pct;
            let re_broke = is_through_pivot(side, price, pivot);
            let retest_ok = retest_volume_ratio.map(|v| v >= cfg.retest_vol_threshold).unwrap_or(false);

            if near_pivot && re_broke && retest_ok {
                tracker.state = BreakoutState::ReadyToEnter;
                return BreakoutOutcome::ReadyToEnter(BreakoutType::Pullback);
            }

            let tolerance_breached = !is_through_pivot(side, price, pivot)
                && pct_distance(price, pivot) > cfg.sustained_tolerance_pct;
            if tolerance_breached {
                tracker.sustained_hold_origin_bar = None;
            }
            BreakoutOutcome::NoChange
        }
        BreakoutEvent::CandleClose {
            bar_index,
            volume_ratio,
            candle_size_pct,
            ..
        } => {
            if classify_weak_or_momentum(cfg, volume_ratio, candle_size_pct) == WeakOrMomentum::Momentum {
                tracker.classification = Some(BreakoutType::Momentum);
                tracker.state = BreakoutState::MomentumConfirmWait;
                return BreakoutOutcome::NoChange;
            }

            if let Some(origin) = tracker.sustained_hold_origin_bar {
                let minutes_held = bar_index.saturating_sub(origin);
                if minutes_held >= cfg.sustained_minutes as u64 {
                    tracker.state = BreakoutState::ReadyToEnter;
                    return BreakoutOutcome::ReadyToEnter(BreakoutType::Sustained);
                }
            } else {
                tracker.sustained_hold_origin_bar = Some(bar_index);
            }
            BreakoutOutcome::NoChange
        }
    }
}

fn evaluate_cvd_monitoring(
    cfg: &BreakoutConfig,
    tracker: &mut BreakoutTracker,
    side: Side,
    pivot: Micros,
    event: BreakoutEvent,
) -> BreakoutOutcome {
    let BreakoutEvent::CandleClose {
        bar_index,
        close,
        volume_ratio,
        candle_size_pct,
        cvd_slope,
        first_target,
    } = event
    else {
        return BreakoutOutcome::NoChange;
    };

    let start = tracker.cvd_monitoring_start_bar.unwrap_or(bar_index);
    if bar_index.saturating_sub(start) >= cfg.cvd_max_minutes as u64 {
        tracker.reset_for_retry();
        return BreakoutOutcome::Failed(FailReason::CvdTimeout);
    }

    // Momentum short-circuit: a momentum-grade candle while CVD is armed
    // wins outright, per the tie-break rule.
    if classify_weak_or_momentum(cfg, volume_ratio, candle_size_pct) == WeakOrMomentum::Momentum {
        if cvd_price_validation(side, close, pivot, first_target) {
            tracker.state = BreakoutState::ReadyToEnter;
            return BreakoutOutcome::ReadyToEnter(BreakoutType::Momentum);
        }
        return BreakoutOutcome::NoChange;
    }

    let Some(slope) = cvd_slope else {
        return BreakoutOutcome::NoChange;
    };

    if slope >= cfg.strong_cvd_threshold {
        if cvd_price_validation(side, close, pivot, first_target) {
            tracker.state = BreakoutState::ReadyToEnter;
            return BreakoutOutcome::ReadyToEnter(BreakoutType::Cvd);
        }
        return BreakoutOutcome::NoChange;
    }

    if slope >= cfg.min_cvd_threshold {
        tracker.cvd_aligned_count += 1;
        if tracker.cvd_aligned_count >= cfg.min_consecutive_aligned
            && cvd_price_validation(side, close, pivot, first_target)
        {
            tracker.state = BreakoutState::ReadyToEnter;
            return BreakoutOutcome::ReadyToEnter(BreakoutType::Cvd);
        }
        return BreakoutOutcome::NoChange;
    }

    if slope <= -cfg.min_cvd_threshold {
        tracker.cvd_aligned_count = 0;
    }
    BreakoutOutcome::NoChange
}

/// Called by the scheduler after the filter pipeline runs on a
/// `ReadyToEnter` tracker. `entered == false` advances the attempt counter
/// and seals the pivot once it exceeds `max_attempts_per_pivot`.
pub fn record_attempt_result(cfg: &BreakoutConfig, tracker: &mut BreakoutTracker, entered: bool) {
    if entered {
        tracker.reset_for_retry();
        tracker.attempt = 0;
        return;
    }
    tracker.attempt += 1;
    if tracker.attempt > cfg.max_attempts_per_pivot {
        tracker.sealed = true;
    }
    tracker.reset_for_retry();
}
