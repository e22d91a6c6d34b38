//! brk-execution
//!
//! The broker boundary (C5/C7 support): the four-operation `BrokerAdapter`
//! trait, the order intents the position manager emits, and the thin
//! `OrderRouter` that translates one into the other and drives startup
//! reconciliation. No strategy or risk logic lives here — only routing.

mod order_router;
mod types;

pub use order_router::{BrokerAdapter, OrderRouter};
pub use types::{ExistingPosition, Fill, OrderIntent, PendingOrderId, ReconcileAction, Tick};
