//! Maps the canonical `trading.*` / `execution.*` / `risk.*` configuration
//! hierarchy onto the per-component config structs each crate already
//! defines. Every key is optional; an absent key keeps that component's
//! own documented default.

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;

use brk_breakout::BreakoutConfig;
use brk_exits::ExitConfig;
use brk_filters::FilterConfig;
use brk_portfolio::PositionConfig;
use brk_risk::RiskConfig;
use brk_types::Micros;

#[derive(Debug, Default, Deserialize)]
struct RawCvdValidation {
    enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCvd {
    enabled: Option<bool>,
    strong_cvd_threshold: Option<f64>,
    min_cvd_threshold: Option<f64>,
    min_consecutive_aligned: Option<u32>,
    cvd_max_minutes: Option<i64>,
    cvd_price_validation: Option<RawCvdValidation>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfirmation {
    strong_vol_threshold: Option<f64>,
    momentum_candle_min_pct: Option<f64>,
    min_volume_threshold: Option<f64>,
    pullback_tolerance_pct: Option<f64>,
    retest_vol_threshold: Option<f64>,
    sustained_minutes: Option<i64>,
    sustained_tolerance_pct: Option<f64>,
    #[serde(default)]
    cvd: RawCvd,
}

#[derive(Debug, Default, Deserialize)]
struct RawFilters {
    enable_choppy: Option<bool>,
    choppy_atr_multiplier: Option<f64>,
    enable_room_to_run: Option<bool>,
    min_room_to_target_pct: Option<f64>,
    enable_gap: Option<bool>,
    max_gap_through_pivot: Option<f64>,
    min_room_to_target: Option<f64>,
    enable_stochastic: Option<bool>,
    min_score: Option<i64>,
    min_risk_reward: Option<f64>,
    avoid_index_shorts: Option<bool>,
    avoid_symbols: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntry {
    min_entry_time: Option<String>,
    max_entry_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAttempts {
    max_attempts_per_pivot: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDynamicResistance {
    proximity_pct: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStall {
    window_minutes: Option<i64>,
    range_pct: Option<f64>,
    tight_trail_pct: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawExits {
    trail_pct: Option<f64>,
    no_progress_minutes: Option<i64>,
    min_progress_per_share: Option<f64>,
    breakeven_after_partial: Option<bool>,
    #[serde(default)]
    dynamic_resistance: RawDynamicResistance,
    #[serde(default)]
    stall: RawStall,
    eod_flush_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTrading {
    account_size: Option<f64>,
    risk_per_trade: Option<f64>,
    #[serde(default)]
    entry: RawEntry,
    #[serde(default)]
    attempts: RawAttempts,
    #[serde(default)]
    confirmation: RawConfirmation,
    #[serde(default)]
    filters: RawFilters,
    #[serde(default)]
    exits: RawExits,
}

#[derive(Debug, Default, Deserialize)]
struct RawSlippage {
    entry_bps: Option<i64>,
    stop_bps: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawExecution {
    #[serde(default)]
    slippage: RawSlippage,
    commission_per_share: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRisk {
    max_positions: Option<u32>,
    max_daily_loss_fraction: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRoot {
    #[serde(default)]
    trading: RawTrading,
    #[serde(default)]
    execution: RawExecution,
    #[serde(default)]
    risk: RawRisk,
}

fn dollars(v: f64) -> Micros {
    Micros::new((v * 1_000_000.0).round() as i64)
}

/// Parses `"HH:MM"` into a minute-of-day. Unrecognized strings are
/// ignored, leaving the caller's default in place.
fn minute_of_day(s: &str) -> Option<u16> {
    let (h, m) = s.split_once(':')?;
    Some(h.parse::<u16>().ok()? * 60 + m.parse::<u16>().ok()?)
}

pub struct MappedConfig {
    pub account_equity: Micros,
    pub position: PositionConfig,
    pub risk: RiskConfig,
    pub breakout: BreakoutConfig,
    pub filters: FilterConfig,
    pub exits: ExitConfig,
}

/// Builds every component config from its own `Default`, then overlays
/// whichever keys the loaded document actually sets.
pub fn map_config(config_json: &Value, default_equity: Micros) -> Result<MappedConfig> {
    let raw: RawRoot = serde_json::from_value(config_json.clone())?;

    let account_equity = raw.trading.account_size.map(dollars).unwrap_or(default_equity);

    let mut position = PositionConfig::default();
    if let Some(v) = raw.trading.risk_per_trade {
        position.risk_per_trade = v;
    }
    if let Some(v) = raw.execution.commission_per_share {
        position.commission_per_share = dollars(v);
    }

    let mut risk = RiskConfig::default();
    if let Some(v) = raw.risk.max_positions {
        risk.max_positions = v;
    }
    if let Some(v) = raw.risk.max_daily_loss_fraction {
        risk.max_daily_loss_fraction = v;
    }

    let mut breakout = BreakoutConfig::default();
    let c = &raw.trading.confirmation;
    if let Some(v) = c.strong_vol_threshold {
        breakout.strong_vol_threshold = v;
    }
    if let Some(v) = c.momentum_candle_min_pct {
        breakout.momentum_candle_min_pct = v;
    }
    if let Some(v) = c.min_volume_threshold {
        breakout.min_volume_threshold = v;
    }
    if let Some(v) = c.pullback_tolerance_pct {
        breakout.pullback_tolerance_pct = v;
    }
    if let Some(v) = c.retest_vol_threshold {
        breakout.retest_vol_threshold = v;
    }
    if let Some(v) = c.sustained_minutes {
        breakout.sustained_minutes = v;
    }
    if let Some(v) = c.sustained_tolerance_pct {
        breakout.sustained_tolerance_pct = v;
    }
    if let Some(v) = c.cvd.enabled {
        breakout.cvd_enabled = v;
    }
    if let Some(v) = c.cvd.strong_cvd_threshold {
        breakout.strong_cvd_threshold = v;
    }
    if let Some(v) = c.cvd.min_cvd_threshold {
        breakout.min_cvd_threshold = v;
    }
    if let Some(v) = c.cvd.min_consecutive_aligned {
        breakout.min_consecutive_aligned = v;
    }
    if let Some(v) = c.cvd.cvd_max_minutes {
        breakout.cvd_max_minutes = v;
    }
    if let Some(v) = c.cvd.cvd_price_validation.enabled {
        breakout.cvd_price_validation_enabled = v;
    }
    if let Some(v) = raw.trading.attempts.max_attempts_per_pivot {
        breakout.max_attempts_per_pivot = v;
    }

    let mut filters = FilterConfig::default();
    if let Some(s) = &raw.trading.entry.min_entry_time {
        if let Some(m) = minute_of_day(s) {
            filters.min_entry_minute_of_day = m;
        }
    }
    if let Some(s) = &raw.trading.entry.max_entry_time {
        if let Some(m) = minute_of_day(s) {
            filters.max_entry_minute_of_day = m;
        }
    }
    let f = &raw.trading.filters;
    if let Some(v) = f.avoid_symbols.clone() {
        filters.avoid_symbols = v;
    }
    if let Some(v) = f.avoid_index_shorts {
        filters.avoid_index_shorts = v;
    }
    if let Some(v) = f.enable_gap {
        filters.enable_gap = v;
    }
    if let Some(v) = f.max_gap_through_pivot {
        filters.small_gap_max_pct = v;
    }
    if let Some(v) = f.min_room_to_target {
        filters.gap_room_min_pct = v;
    }
    if let Some(v) = raw.trading.attempts.max_attempts_per_pivot {
        filters.max_attempts_per_pivot = v;
    }
    if let Some(v) = f.enable_choppy {
        filters.enable_choppy = v;
    }
    if let Some(v) = f.choppy_atr_multiplier {
        filters.choppy_atr_multiplier = v;
    }
    if let Some(v) = f.enable_room_to_run {
        filters.enable_room_to_run = v;
    }
    if let Some(v) = f.min_room_to_target_pct {
        filters.min_room_to_target_pct = v;
    }
    if let Some(v) = f.enable_stochastic {
        filters.enable_stochastic = v;
    }
    if f.min_score.is_some() {
        filters.min_score = f.min_score;
    }
    if let Some(v) = f.min_risk_reward {
        filters.min_risk_reward_x100 = Some((v * 100.0).round() as i64);
    }

    let mut exits = ExitConfig::default();
    let e = &raw.trading.exits;
    if let Some(v) = e.trail_pct {
        exits.tight_trail_pct = v;
    }
    if let Some(v) = e.no_progress_minutes {
        exits.no_progress_minutes = v;
    }
    if let Some(v) = e.min_progress_per_share {
        exits.min_progress_per_share = dollars(v);
    }
    if let Some(v) = e.dynamic_resistance.proximity_pct {
        exits.resistance_proximity_pct = v;
    }
    if let Some(v) = e.stall.window_minutes {
        exits.stall_window_minutes = v;
    }
    if let Some(v) = e.stall.range_pct {
        exits.stall_range_pct = v;
    }
    if let Some(v) = e.stall.tight_trail_pct {
        exits.tight_trail_pct = v;
    }
    if let Some(s) = &e.eod_flush_time {
        if let Some(m) = minute_of_day(s) {
            exits.eod_flush_minute_of_day = m;
        }
    }
    if let Some(v) = raw.execution.slippage.entry_bps {
        exits.entry_mid_slippage_bps = v;
    }
    if let Some(v) = raw.execution.slippage.stop_bps {
        exits.stop_slippage_bps = v;
    }

    Ok(MappedConfig {
        account_equity,
        position,
        risk,
        breakout,
        filters,
        exits,
    })
}
