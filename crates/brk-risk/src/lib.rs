//! brk-risk
//!
//! Session-level risk guards (C5 support): a daily-loss halt and a
//! concurrent-position cap. Deterministic, pure logic — no IO, no time, no
//! broker calls. `evaluate` is the only entry point; `RiskState` is the
//! only mutable thing it touches, and a halt is terminal for the session.

mod engine;
mod types;

pub use engine::evaluate;
pub use types::{ReasonCode, RiskAction, RiskConfig, RiskDecision, RiskInput, RiskState};
