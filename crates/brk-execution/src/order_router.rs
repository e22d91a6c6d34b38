//! The thin, deterministic boundary between the position manager and a
//! concrete broker. `OrderRouter` does no business logic of its own — it
//! just translates an `OrderIntent` into the matching `BrokerAdapter` call
//! and runs the startup reconciliation sequence from a live broker.

use std::error::Error;

use brk_types::Side;

use crate::types::{ExistingPosition, Fill, OrderIntent, PendingOrderId, ReconcileAction, Tick};

/// The four operations the engine requires from any broker, plus the
/// startup reconciliation queries and the tick/fill drains a poll-driven
/// event loop needs in place of async callbacks.
pub trait BrokerAdapter {
    type Error: Error + Send + Sync + 'static;

    fn subscribe_market_data(&mut self, symbol: &str) -> Result<(), Self::Error>;
    fn place_market_order(
        &mut self,
        symbol: &str,
        side: Side,
        shares: i64,
    ) -> Result<PendingOrderId, Self::Error>;
    fn place_stop_order(
        &mut self,
        symbol: &str,
        side: Side,
        shares: i64,
        stop_price: brk_types::Micros,
    ) -> Result<PendingOrderId, Self::Error>;
    fn cancel(&mut self, order_id: &PendingOrderId) -> Result<(), Self::Error>;

    /// Ticks queued since the last drain, oldest first.
    fn poll_ticks(&mut self) -> Vec<Tick>;
    /// Fills queued since the last drain, oldest first.
    fn poll_fills(&mut self) -> Vec<Fill>;

    fn existing_positions(&mut self) -> Result<Vec<ExistingPosition>, Self::Error>;
    fn existing_order_ids(&mut self) -> Result<Vec<PendingOrderId>, Self::Error>;
}

pub struct OrderRouter<B: BrokerAdapter> {
    broker: B,
}

impl<B: BrokerAdapter> OrderRouter<B> {
    pub fn new(broker: B) -> Self {
        OrderRouter { broker }
    }

    pub fn route(&mut self, intent: OrderIntent) -> Result<PendingOrderId, B::Error> {
        match intent {
            OrderIntent::Market { symbol, side, shares } => {
                self.broker.place_market_order(&symbol, side, shares)
            }
            OrderIntent::Stop {
                symbol,
                side,
                shares,
                stop_price,
            } => self.broker.place_stop_order(&symbol, side, shares, stop_price),
        }
    }

    pub fn cancel(&mut self, order_id: &PendingOrderId) -> Result<(), B::Error> {
        self.broker.cancel(order_id)
    }

    pub fn subscribe(&mut self, symbol: &str) -> Result<(), B::Error> {
        self.broker.subscribe_market_data(symbol)
    }

    pub fn poll_ticks(&mut self) -> Vec<Tick> {
        self.broker.poll_ticks()
    }

    pub fn poll_fills(&mut self) -> Vec<Fill> {
        self.broker.poll_fills()
    }

    /// Cancel every order the broker reports open, then apply `policy` to
    /// every position the broker reports open. Returns what it found so
    /// the caller can seed its own position book.
    pub fn reconcile_startup(
        &mut self,
        policy: ReconcileAction,
    ) -> Result<Vec<(ExistingPosition, ReconcileAction)>, B::Error> {
        for id in self.broker.existing_order_ids()? {
            self.broker.cancel(&id)?;
        }

        let positions = self.broker.existing_positions()?;
        if policy == ReconcileAction::Flatten {
            for p in &positions {
                self.broker
                    .place_market_order(&p.symbol, p.side.opposite(), p.shares)?;
            }
        }

        Ok(positions.into_iter().map(|p| (p, policy)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brk_types::Micros;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::convert::Infallible;

    #[derive(Default)]
    struct MockBroker {
        submitted: RefCell<Vec<(String, Side, i64)>>,
        cancelled: RefCell<Vec<PendingOrderId>>,
        positions: Vec<ExistingPosition>,
        open_orders: Vec<PendingOrderId>,
        fills: VecDeque<Fill>,
        next_id: u64,
    }

    impl BrokerAdapter for MockBroker {
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
            self.submitted.borrow_mut().push((symbol.to_string(), side, shares));
            self.next_id += 1;
            Ok(PendingOrderId::new(format!("mkt-{}", self.next_id)))
        }

        fn place_stop_order(
            &mut self,
            symbol: &str,
            side: Side,
            shares: i64,
            _stop_price: Micros,
        ) -> Result<PendingOrderId, Self::Error> {
            self.submitted.borrow_mut().push((symbol.to_string(), side, shares));
            self.next_id += 1;
            Ok(PendingOrderId::new(format!("stp-{}", self.next_id)))
        }

        fn cancel(&mut self, order_id: &PendingOrderId) -> Result<(), Self::Error> {
            self.cancelled.borrow_mut().push(order_id.clone());
            Ok(())
        }

        fn poll_ticks(&mut self) -> Vec<Tick> {
            Vec::new()
        }

        fn poll_fills(&mut self) -> Vec<Fill> {
            self.fills.drain(..).collect()
        }

        fn existing_positions(&mut self) -> Result<Vec<ExistingPosition>, Self::Error> {
            Ok(self.positions.clone())
        }

        fn existing_order_ids(&mut self) -> Result<Vec<PendingOrderId>, Self::Error> {
            Ok(self.open_orders.clone())
        }
    }

    #[test]
    fn route_market_order_delegates_to_broker() {
        let mut router = OrderRouter::new(MockBroker::default());
        let id = router
            .route(OrderIntent::Market {
                symbol: "AAPL".to_string(),
                side: Side::Long,
                shares: 100,
            })
            .unwrap();
        assert_eq!(id.0, "mkt-1");
        assert_eq!(
            router.broker.submitted.borrow()[0],
            ("AAPL".to_string(), Side::Long, 100)
        );
    }

    #[test]
    fn route_stop_order_delegates_to_broker() {
        let mut router = OrderRouter::new(MockBroker::default());
        let id = router
            .route(OrderIntent::Stop {
                symbol: "AAPL".to_string(),
                side: Side::Short,
                shares: 50,
                stop_price: Micros::from_dollars(99),
            })
            .unwrap();
        assert_eq!(id.0, "stp-1");
    }

    #[test]
    fn reconcile_startup_cancels_every_open_order() {
        let mut broker = MockBroker::default();
        broker.open_orders = vec![PendingOrderId::new("a"), PendingOrderId::new("b")];
        let mut router = OrderRouter::new(broker);

        router.reconcile_startup(ReconcileAction::AdoptAsRunner).unwrap();

        assert_eq!(router.broker.cancelled.borrow().len(), 2);
    }

    #[test]
    fn reconcile_startup_flatten_places_opposing_market_orders() {
        let mut broker = MockBroker::default();
        broker.positions = vec![ExistingPosition {
            symbol: "MSFT".to_string(),
            side: Side::Long,
            shares: 30,
        }];
        let mut router = OrderRouter::new(broker);

        let result = router.reconcile_startup(ReconcileAction::Flatten).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(
            router.broker.submitted.borrow()[0],
            ("MSFT".to_string(), Side::Short, 30)
        );
    }

    #[test]
    fn reconcile_startup_adopt_as_runner_places_no_orders() {
        let mut broker = MockBroker::default();
        broker.positions = vec![ExistingPosition {
            symbol: "MSFT".to_string(),
            side: Side::Long,
            shares: 30,
        }];
        let mut router = OrderRouter::new(broker);

        router.reconcile_startup(ReconcileAction::AdoptAsRunner).unwrap();

        assert!(router.broker.submitted.borrow().is_empty());
    }
}
