//! brk-scheduler
//!
//! The replay scheduler (C7): loads the scanner watchlist and historical
//! bars for backtest mode, drives every symbol's bar-aggregator,
//! indicators, breakout tracker, filter pipeline, position manager, exit
//! policy, and risk guard through one deterministic event loop, and
//! writes every entry decision and position event to the decision
//! journal (C8) as it goes.
//!
//! Event ordering is fixed: ingest, indicators, open-position
//! management, exit checks, idle-symbol entry checks, journal flush —
//! the same order for every bar, live or replayed.

mod engine;
mod loader;
pub mod types;
mod watchlist;

pub use engine::ReplayEngine;
pub use loader::{load_session_bars, session_bar_filename, LoadedSessionBars, EXPECTED_BAR_RECORDS, MIN_BAR_RECORDS};
pub use types::{EquityPoint, ReplayError, SchedulerConfig, SessionReport};
pub use watchlist::load_watchlist;
