//! brk-broker-paper
//!
//! A deterministic in-memory `BrokerAdapter`: no randomness, no wall-clock
//! reads. Market orders fill immediately at the last price fed in via
//! `advance_price`; stop orders rest until a subsequent `advance_price`
//! crosses the stop, then fill at the stop price. Intended for backtest
//! and paper-trading runs where a real broker connection isn't wired up.

use std::collections::{BTreeMap, VecDeque};
use std::convert::Infallible;

use brk_execution::{
    BrokerAdapter, ExistingPosition, Fill, OrderIntent, PendingOrderId, Tick,
};
use brk_types::{Micros, Side};

#[derive(Clone, Debug)]
struct RestingStop {
    symbol: String,
    side: Side,
    shares: i64,
    stop_price: Micros,
}

#[derive(Debug, Default)]
pub struct PaperBroker {
    next_id: u64,
    last_price: BTreeMap<String, Micros>,
    resting_stops: BTreeMap<PendingOrderId, RestingStop>,
    pending_ticks: VecDeque<Tick>,
    pending_fills: VecDeque<Fill>,
    seeded_positions: Vec<ExistingPosition>,
    seeded_order_ids: Vec<PendingOrderId>,
}

impl PaperBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self, prefix: &str) -> PendingOrderId {
        self.next_id += 1;
        PendingOrderId::new(format!("{prefix}-{}", self.next_id))
    }

    /// Feed a new price for `symbol`. Enqueues a tick for `poll_ticks` and
    /// fills any resting stop order crossed by the move.
    pub fn advance_price(&mut self, symbol: &str, price: Micros, timestamp: i64) {
        self.last_price.insert(symbol.to_string(), price);
        self.pending_ticks.push_back(Tick {
            symbol: symbol.to_string(),
            price,
            timestamp,
        });

        let crossed: Vec<PendingOrderId> = self
            .resting_stops
            .iter()
            .filter(|(_, s)| s.symbol == symbol && stop_crossed(s, price))
            .map(|(id, _)| id.clone())
            .collect();

        for id in crossed {
            let stop = self.resting_stops.remove(&id).unwrap();
            self.pending_fills.push_back(Fill {
                order_id: id,
                fill_price: stop.stop_price,
                fill_time: timestamp,
                shares: stop.shares,
            });
        }
    }

    /// Seed what `existing_positions`/`existing_order_ids` report, for
    /// startup-reconciliation tests.
    pub fn seed_existing(&mut self, positions: Vec<ExistingPosition>, order_ids: Vec<PendingOrderId>) {
        self.seeded_positions = positions;
        self.seeded_order_ids = order_ids;
    }

    pub fn route(&mut self, intent: OrderIntent) -> PendingOrderId {
        match intent {
            OrderIntent::Market { symbol, side, shares } => self
                .place_market_order(&symbol, side, shares)
                .expect("paper broker is infallible"),
            OrderIntent::Stop {
                symbol,
                side,
                shares,
                stop_price,
            } => self
                .place_stop_order(&symbol, side, shares, stop_price)
                .expect("paper broker is infallible"),
        }
    }
}

fn stop_crossed(stop: &RestingStop, price: Micros) -> bool {
    match stop.side {
        // A long stop (protecting a long position) triggers on the way down.
        Side::Long => price <= stop.stop_price,
        Side::Short => price >= stop.stop_price,
    }
}

impl BrokerAdapter for PaperBroker {
    type Error = Infallible;

    fn subscribe_market_data(&mut self, _symbol: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn place_market_order(
        &mut self,
        symbol: &str,
        side: Side,
        shares: i64,
    ) -> Result<PendingOrderId, Self::Error> {
        let id = self.fresh_id("mkt");
        let price = self
            .last_price
            .get(symbol)
            .copied()
            .unwrap_or(Micros::ZERO);
        self.pending_fills.push_back(Fill {
            order_id: id.clone(),
            fill_price: price,
            fill_time: 0,
            shares,
        });
        let _ = side;
        Ok(id)
    }

    fn place_stop_order(
        &mut self,
        symbol: &str,
        side: Side,
        shares: i64,
        stop_price: Micros,
    ) -> Result<PendingOrderId, Self::Error> {
        let id = self.fresh_id("stp");
        self.resting_stops.insert(
            id.clone(),
            RestingStop {
                symbol: symbol.to_string(),
                side,
                shares,
                stop_price,
            },
        );
        Ok(id)
    }

    fn cancel(&mut self, order_id: &PendingOrderId) -> Result<(), Self::Error> {
        self.resting_stops.remove(order_id);
        Ok(())
    }

    fn poll_ticks(&mut self) -> Vec<Tick> {
        self.pending_ticks.drain(..).collect()
    }

    fn poll_fills(&mut self) -> Vec<Fill> {
        self.pending_fills.drain(..).collect()
    }

    fn existing_positions(&mut self) -> Result<Vec<ExistingPosition>, Self::Error> {
        Ok(self.seeded_positions.clone())
    }

    fn existing_order_ids(&mut self) -> Result<Vec<PendingOrderId>, Self::Error> {
        Ok(self.seeded_order_ids.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_order_fills_at_last_price() {
        let mut b = PaperBroker::new();
        b.advance_price("AAPL", Micros::from_dollars(100), 1);
        let id = b.place_market_order("AAPL", Side::Long, 10).unwrap();

        let fills = b.poll_fills();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].order_id, id);
        assert_eq!(fills[0].fill_price, Micros::from_dollars(100));
        assert_eq!(fills[0].shares, 10);
    }

    #[test]
    fn market_order_before_any_price_fills_at_zero() {
        let mut b = PaperBroker::new();
        let id = b.place_market_order("AAPL", Side::Long, 10).unwrap();
        let fills = b.poll_fills();
        assert_eq!(fills[0].order_id, id);
        assert_eq!(fills[0].fill_price, Micros::ZERO);
    }

    #[test]
    fn long_stop_fills_when_price_drops_to_or_through_it() {
        let mut b = PaperBroker::new();
        b.advance_price("AAPL", Micros::from_dollars(100), 1);
        let id = b
            .place_stop_order("AAPL", Side::Long, 10, Micros::from_dollars(95))
            .unwrap();

        b.advance_price("AAPL", Micros::from_dollars(97), 2);
        assert!(b.poll_fills().is_empty(), "stop not yet crossed");

        b.advance_price("AAPL", Micros::from_dollars(94), 3);
        let fills = b.poll_fills();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].order_id, id);
        assert_eq!(fills[0].fill_price, Micros::from_dollars(95));
    }

    #[test]
    fn short_stop_fills_when_price_rises_to_or_through_it() {
        let mut b = PaperBroker::new();
        b.advance_price("AAPL", Micros::from_dollars(100), 1);
        b.place_stop_order("AAPL", Side::Short, 10, Micros::from_dollars(105))
            .unwrap();

        b.advance_price("AAPL", Micros::from_dollars(106), 2);
        let fills = b.poll_fills();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].fill_price, Micros::from_dollars(105));
    }

    #[test]
    fn cancel_removes_resting_stop_before_it_fills() {
        let mut b = PaperBroker::new();
        b.advance_price("AAPL", Micros::from_dollars(100), 1);
        let id = b
            .place_stop_order("AAPL", Side::Long, 10, Micros::from_dollars(95))
            .unwrap();
        b.cancel(&id).unwrap();

        b.advance_price("AAPL", Micros::from_dollars(90), 2);
        assert!(b.poll_fills().is_empty());
    }

    #[test]
    fn seeded_reconciliation_state_is_reported_once() {
        let mut b = PaperBroker::new();
        b.seed_existing(
            vec![ExistingPosition {
                symbol: "MSFT".to_string(),
                side: Side::Long,
                shares: 5,
            }],
            vec![PendingOrderId::new("stale-1")],
        );

        assert_eq!(b.existing_positions().unwrap().len(), 1);
        assert_eq!(b.existing_order_ids().unwrap().len(), 1);
    }
}
