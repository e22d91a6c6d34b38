//! brk-types
//!
//! Shared, dependency-free domain primitives: the fixed-point `Micros`
//! money type, the `Bps` ratio type, `Side`/`SideHint`, the scanner
//! `Setup` record, and the `Bar` record. Every other crate in this
//! workspace builds on these instead of re-deriving them.

mod bar;
mod bps;
mod micros;
mod setup;
mod side;

pub use bar::Bar;
pub use bps::Bps;
pub use micros::{Micros, MICROS_SCALE};
pub use setup::Setup;
pub use side::{Side, SideHint};
