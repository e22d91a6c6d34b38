use brk_types::{Micros, Side};

/// Opaque handle the broker hands back from a submit/place call. Never
/// constructed by this crate; only round-tripped to `cancel`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PendingOrderId(pub String);

impl PendingOrderId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        PendingOrderId(id.into())
    }
}

/// A single market data tick delivered by `subscribe_market_data`.
#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    pub symbol: String,
    pub price: Micros,
    pub timestamp: i64,
}

/// A broker fill callback, keyed by the `PendingOrderId` it fills.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fill {
    pub order_id: PendingOrderId,
    pub fill_price: Micros,
    pub fill_time: i64,
    pub shares: i64,
}

/// The two order shapes the position manager ever asks the broker to place.
/// Shares are always positive; direction comes from `side`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderIntent {
    Market {
        symbol: String,
        side: Side,
        shares: i64,
    },
    Stop {
        symbol: String,
        side: Side,
        shares: i64,
        stop_price: Micros,
    },
}

impl OrderIntent {
    pub fn symbol(&self) -> &str {
        match self {
            OrderIntent::Market { symbol, .. } => symbol,
            OrderIntent::Stop { symbol, .. } => symbol,
        }
    }
}

/// What to do with a position the broker reports as already open at
/// startup, per the reconciliation policy in config.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Keep the position but treat it as a bare runner: no partial ladder,
    /// only the trailing-stop machinery applies going forward.
    AdoptAsRunner,
    /// Close the position at market immediately.
    Flatten,
}

/// A position/open-order pair discovered during startup reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExistingPosition {
    pub symbol: String,
    pub side: Side,
    pub shares: i64,
}
