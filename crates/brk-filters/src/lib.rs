//! brk-filters
//!
//! The ordered entry filter pipeline: eight independently-enableable
//! predicates evaluated in a fixed sequence, first block wins. Expressed
//! as a closed array of function pointers rather than a trait-object
//! chain, so the order is a compile-time fact rather than a runtime
//! registration accident.

mod engine;
mod types;

pub use engine::run_pipeline;
pub use types::{BlockRecord, FilterConfig, FilterInput, FilterOutcome};
