//! brk-portfolio
//!
//! The position lifecycle manager (C5): risk-based sizing, the partial
//! target ladder, breakeven/ladder/trailing stop progression, and the
//! commission-aware P&L accounting on each leg. At most one open position
//! per symbol; everything here is a pure function over `(config, position,
//! market snapshot)` — the position itself is the only mutable state.

mod config;
mod engine;
mod ladder;
mod sizing;
mod types;

pub use config::PositionConfig;
pub use engine::{close, evaluate_ladder, mark, open, take_resistance_partial, tighten_trailing};
pub use ladder::{build_ladder, fractions_for_ladder};
pub use sizing::compute_shares;
pub use types::{
    ClosedPosition, CloseReason, Partial, PartialReason, Position, PortfolioState,
};
