//! brk-breakout
//!
//! The per-(symbol, pivot) breakout confirmation state machine: from
//! `Monitoring` through candle-close classification, weak-breakout
//! tracking (pullback/sustained) or CVD-delayed confirmation, to
//! `ReadyToEnter` or `Failed`. `evaluate` is a pure function over
//! `(config, tracker, pivot, event)` — the tracker is the only state, and
//! every input it reads is a snapshot handed down by the scheduler.

mod engine;
mod types;

pub use engine::{evaluate, record_attempt_result, BreakoutEvent, BreakoutOutcome};
pub use types::{BreakoutConfig, BreakoutState, BreakoutTracker, BreakoutType, FailReason};
