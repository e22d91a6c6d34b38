use serde::{Deserialize, Serialize};

use brk_types::{Micros, Side};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub min_entry_minute_of_day: u16,
    pub max_entry_minute_of_day: u16,

    pub avoid_symbols: Vec<String>,
    pub avoid_index_shorts: bool,

    pub enable_gap: bool,
    pub small_gap_max_pct: f64,
    pub gap_room_min_pct: f64,

    pub max_attempts_per_pivot: u32,

    pub enable_choppy: bool,
    pub choppy_atr_multiplier: f64,

    pub enable_room_to_run: bool,
    pub min_room_to_target_pct: f64,

    pub enable_stochastic: bool,

    pub min_score: Option<i64>,
    pub min_risk_reward_x100: Option<i64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            min_entry_minute_of_day: 9 * 60 + 45,
            max_entry_minute_of_day: 15 * 60,
            avoid_symbols: Vec::new(),
            avoid_index_shorts: true,
            enable_gap: true,
            small_gap_max_pct: 1.0,
            gap_room_min_pct: 3.0,
            max_attempts_per_pivot: 2,
            enable_choppy: true,
            choppy_atr_multiplier: 0.5,
            enable_room_to_run: true,
            min_room_to_target_pct: 1.5,
            enable_stochastic: true,
            min_score: None,
            min_risk_reward_x100: None,
        }
    }
}

/// Every value a filter needs, precomputed upstream by `brk-indicators`
/// and the scheduler. Filters are pure predicates over this snapshot —
/// none of them reach back into indicator or breakout state.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterInput {
    pub symbol: String,
    pub side: Side,
    pub is_index_proxy: bool,
    pub minute_of_day: u16,
    pub attempt_count: u32,

    /// `Some` only on the single pre-entry gap evaluation at market open.
    pub gap_through_pivot_pct: Option<f64>,
    pub gap_room_to_target_pct: Option<f64>,

    pub last_5min_range: Option<Micros>,
    pub atr20: Option<f64>,

    pub current_price: Micros,
    /// The dynamically-chosen target per §4.4 rule 6 (prefer target3,
    /// else target2, else target1 — whichever is still ahead of price).
    pub highest_viable_target: Option<Micros>,

    pub stoch_k: Option<f64>,

    pub score: i64,
    pub risk_reward_x100: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlockRecord {
    pub filter_name: &'static str,
    pub observed_value: f64,
    pub threshold: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FilterOutcome {
    Pass,
    Block(BlockRecord),
    /// The gap filter's "remove from watchlist for the day" verdict —
    /// distinct from an ordinary block because it is permanent, not
    /// per-attempt.
    RemoveForDay(BlockRecord),
}
