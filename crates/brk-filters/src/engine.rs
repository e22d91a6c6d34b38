use brk_types::Side;

use crate::types::{BlockRecord, FilterConfig, FilterInput, FilterOutcome};

fn pct_room(side: Side, current: brk_types::Micros, target: brk_types::Micros) -> f64 {
    let diff = match side {
        Side::Long => target.raw() - current.raw(),
        Side::Short => current.raw() - target.raw(),
    };
    diff as f64 / current.raw() as f64 * 100.0
}

fn entry_time_window(cfg: &FilterConfig, input: &FilterInput) -> FilterOutcome {
    if input.minute_of_day < cfg.min_entry_minute_of_day || input.minute_of_day > cfg.max_entry_minute_of_day {
        return FilterOutcome::Block(BlockRecord {
            filter_name: "entry_time_window",
            observed_value: input.minute_of_day as f64,
            threshold: cfg.min_entry_minute_of_day as f64,
        });
    }
    FilterOutcome::Pass
}

fn symbol_policy(cfg: &FilterConfig, input: &FilterInput) -> FilterOutcome {
    if cfg.avoid_symbols.iter().any(|s| s == &input.symbol) {
        return FilterOutcome::Block(BlockRecord {
            filter_name: "symbol_policy",
            observed_value: 1.0,
            threshold: 0.0,
        });
    }
    if cfg.avoid_index_shorts && input.side == Side::Short && input.is_index_proxy {
        return FilterOutcome::Block(BlockRecord {
            filter_name: "symbol_policy",
            observed_value: 1.0,
            threshold: 0.0,
        });
    }
    FilterOutcome::Pass
}

fn gap_filter(cfg: &FilterConfig, input: &FilterInput) -> FilterOutcome {
    if !cfg.enable_gap {
        return FilterOutcome::Pass;
    }
    let Some(gap_pct) = input.gap_through_pivot_pct else {
        return FilterOutcome::Pass;
    };
    if gap_pct <= cfg.small_gap_max_pct {
        return FilterOutcome::Pass;
    }
    let room = input.gap_room_to_target_pct.unwrap_or(0.0);
    if room >= cfg.gap_room_min_pct {
        return FilterOutcome::Pass;
    }
    FilterOutcome::RemoveForDay(BlockRecord {
        filter_name: "gap_filter",
        observed_value: gap_pct,
        threshold: cfg.small_gap_max_pct,
    })
}

fn attempt_cap(cfg: &FilterConfig, input: &FilterInput) -> FilterOutcome {
    if input.attempt_count >= cfg.max_attempts_per_pivot {
        return FilterOutcome::Block(BlockRecord {
            filter_name: "attempt_cap",
            observed_value: input.attempt_count as f64,
            threshold: cfg.max_attempts_per_pivot as f64,
        });
    }
    FilterOutcome::Pass
}

fn choppy_filter(cfg: &FilterConfig, input: &FilterInput) -> FilterOutcome {
    if !cfg.enable_choppy {
        return FilterOutcome::Pass;
    }
    let (Some(range), Some(atr)) = (input.last_5min_range, input.atr20) else {
        return FilterOutcome::Pass;
    };
    let threshold = cfg.choppy_atr_multiplier * atr;
    if (range.raw() as f64) < threshold {
        return FilterOutcome::Block(BlockRecord {
            filter_name: "choppy_filter",
            observed_value: range.raw() as f64,
            threshold,
        });
    }
    FilterOutcome::Pass
}

fn room_to_run(cfg: &FilterConfig, input: &FilterInput) -> FilterOutcome {
    if !cfg.enable_room_to_run {
        return FilterOutcome::Pass;
    }
    let Some(target) = input.highest_viable_target else {
        return FilterOutcome::Block(BlockRecord {
            filter_name: "room_to_run",
            observed_value: 0.0,
            threshold: cfg.min_room_to_target_pct,
        });
    };
    let room = pct_room(input.side, input.current_price, target);
    if room < cfg.min_room_to_target_pct {
        return FilterOutcome::Block(BlockRecord {
            filter_name: "room_to_run",
            observed_value: room,
            threshold: cfg.min_room_to_target_pct,
        });
    }
    FilterOutcome::Pass
}

fn stochastic_regime(cfg: &FilterConfig, input: &FilterInput) -> FilterOutcome {
    if !cfg.enable_stochastic {
        return FilterOutcome::Pass;
    }
    let Some(k) = input.stoch_k else {
        return FilterOutcome::Pass;
    };
    let blocked = match input.side {
        Side::Long => !(60.0..=80.0).contains(&k),
        Side::Short => !(20.0..=50.0).contains(&k),
    };
    if blocked {
        return FilterOutcome::Block(BlockRecord {
            filter_name: "stochastic_regime",
            observed_value: k,
            threshold: match input.side {
                Side::Long => 60.0,
                Side::Short => 50.0,
            },
        });
    }
    FilterOutcome::Pass
}

fn quality_score(cfg: &FilterConfig, input: &FilterInput) -> FilterOutcome {
    if let Some(min_score) = cfg.min_score {
        if input.score < min_score {
            return FilterOutcome::Block(BlockRecord {
                filter_name: "quality_score",
                observed_value: input.score as f64,
                threshold: min_score as f64,
            });
        }
    }
    if let Some(min_rr) = cfg.min_risk_reward_x100 {
        if input.risk_reward_x100 < min_rr {
            return FilterOutcome::Block(BlockRecord {
                filter_name: "quality_score",
                observed_value: input.risk_reward_x100 as f64,
                threshold: min_rr as f64,
            });
        }
    }
    FilterOutcome::Pass
}

/// Runs the eight ordered filters, first block wins. Mirrors the default
/// order in §4.4 exactly; each stage is independently toggled by
/// `FilterConfig`, never removed from the sequence.
pub fn run_pipeline(cfg: &FilterConfig, input: &FilterInput) -> FilterOutcome {
    let stages: [fn(&FilterConfig, &FilterInput) -> FilterOutcome; 8] = [
        entry_time_window,
        symbol_policy,
        gap_filter,
        attempt_cap,
        choppy_filter,
        room_to_run,
        stochastic_regime,
        quality_score,
    ];
    for stage in stages {
        match stage(cfg, input) {
            FilterOutcome::Pass => continue,
            other => return other,
        }
    }
    FilterOutcome::Pass
}
