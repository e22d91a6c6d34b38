use crate::{ReasonCode, RiskAction, RiskConfig, RiskDecision, RiskInput, RiskState};

/// Guard: equity must be positive. A non-positive day-start equity makes
/// every downstream fraction-of-equity check meaningless; fail closed
/// rather than let it silently pass every check.
fn validate_equity_input(inp: &RiskInput) -> Option<RiskDecision> {
    if !inp.day_start_equity_micros.is_positive() {
        return Some(RiskDecision {
            action: RiskAction::Halt,
            reason: ReasonCode::BadInput,
        });
    }
    None
}

/// Main evaluator: pure function of `(config, state, input)`, called once
/// per idle-symbol entry check (§5 data flow). `state.halted` is sticky —
/// once tripped it holds for the rest of the session regardless of later
/// equity recovery.
pub fn evaluate(cfg: &RiskConfig, st: &mut RiskState, inp: &RiskInput) -> RiskDecision {
    if let Some(bad) = validate_equity_input(inp) {
        st.halted = true;
        return bad;
    }

    if st.halted {
        return RiskDecision {
            action: RiskAction::Reject,
            reason: ReasonCode::AlreadyHalted,
        };
    }

    let total_pnl = inp.realized_pnl_micros + inp.unrealized_pnl_micros;
    let loss_floor = cfg.max_daily_loss_fraction * inp.day_start_equity_micros.raw() as f64;
    if (total_pnl.raw() as f64) <= -loss_floor {
        st.halted = true;
        return RiskDecision {
            action: RiskAction::Halt,
            reason: ReasonCode::DailyLossLimitBreached,
        };
    }

    if inp.open_position_count >= cfg.max_positions {
        return RiskDecision {
            action: RiskAction::Reject,
            reason: ReasonCode::PositionCapReached,
        };
    }

    RiskDecision::allow()
}
