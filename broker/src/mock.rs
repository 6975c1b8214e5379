//! Mock provider for testing: implements `Brokerage`, `QuoteSource` and
//! `SignalSource` with configurable behavior.
//!
//! Use this in integration tests to simulate provider responses without network calls.
//!
//! ```ignore
//! use signal_broker::mock::MockBroker;
//! use signal_broker::{PositionSide, Symbol};
//!
//! let broker = MockBroker::builder()
//!     .with_equity(100_000_00)
//!     .with_position(Symbol::new("TSLA"), PositionSide::Short, 10)
//!     .with_quote(Symbol::new("AAPL"), 180_00)
//!     .with_signals(&["AAPL"], &[])
//!     .build();
//! ```

use std::sync::Mutex;

use crate::error::BrokerError;
use crate::types::*;
use crate::{Brokerage, QuoteSource, SignalSource, ensure_positive_quantity};

/// A provider call observed by the mock, in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockCall {
    Signals,
    Positions,
    Account,
    Quote(Symbol),
    Order(Symbol),
}

/// A recorded order submission for assertion in tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedOrder {
    pub symbol: Symbol,
    pub side: BrokerSide,
    pub quantity: u64,
    pub order_type: BrokerOrderType,
    pub time_in_force: TimeInForce,
}

/// Builder for `MockBroker`.
pub struct MockBrokerBuilder {
    equity_cents: i64,
    positions: Vec<Position>,
    quotes: Vec<(Symbol, Price)>,
    signals: Option<SignalSet>,
    rejected: Vec<Symbol>,
    account_fails: bool,
    positions_fail: bool,
    settle_on_submit: bool,
}

impl MockBrokerBuilder {
    pub fn with_equity(mut self, equity_cents: i64) -> Self {
        self.equity_cents = equity_cents;
        self
    }

    pub fn with_position(mut self, symbol: Symbol, side: PositionSide, quantity: u64) -> Self {
        self.positions.push(Position {
            symbol,
            side,
            quantity,
        });
        self
    }

    /// Quote a whole-cent price.
    pub fn with_quote(mut self, symbol: Symbol, price_cents: i64) -> Self {
        self.quotes.push((symbol, Price::from_cents(price_cents)));
        self
    }

    /// Quote an exact price, sub-cent digits included.
    pub fn with_price(mut self, symbol: Symbol, price: Price) -> Self {
        self.quotes.push((symbol, price));
        self
    }

    pub fn with_signals(mut self, longs: &[&str], shorts: &[&str]) -> Self {
        self.signals = Some(SignalSet {
            long_symbols: longs.iter().map(|s| Symbol::new(s)).collect(),
            short_symbols: shorts.iter().map(|s| Symbol::new(s)).collect(),
        });
        self
    }

    /// Signal fetch fails with `ProviderUnavailable`.
    pub fn without_signals(mut self) -> Self {
        self.signals = None;
        self
    }

    /// Orders for `symbol` are rejected by the "brokerage".
    pub fn reject_orders_for(mut self, symbol: Symbol) -> Self {
        self.rejected.push(symbol);
        self
    }

    /// Account (equity) requests fail with `ProviderUnavailable`.
    pub fn failing_account(mut self) -> Self {
        self.account_fails = true;
        self
    }

    /// Position requests fail with `ProviderUnavailable`.
    pub fn failing_positions(mut self) -> Self {
        self.positions_fail = true;
        self
    }

    /// Accepted closing orders remove the matching position immediately.
    pub fn settle_on_submit(mut self) -> Self {
        self.settle_on_submit = true;
        self
    }

    pub fn build(self) -> MockBroker {
        MockBroker {
            equity_cents: self.equity_cents,
            positions: Mutex::new(self.positions),
            quotes: self.quotes,
            signals: self.signals,
            rejected: self.rejected,
            account_fails: self.account_fails,
            positions_fail: self.positions_fail,
            settle_on_submit: self.settle_on_submit,
            next_order_id: Mutex::new(1),
            calls: Mutex::new(Vec::new()),
            submitted_orders: Mutex::new(Vec::new()),
        }
    }
}

/// A mock provider that records calls and submitted orders.
pub struct MockBroker {
    equity_cents: i64,
    positions: Mutex<Vec<Position>>,
    quotes: Vec<(Symbol, Price)>,
    signals: Option<SignalSet>,
    rejected: Vec<Symbol>,
    account_fails: bool,
    positions_fail: bool,
    settle_on_submit: bool,
    next_order_id: Mutex<u64>,
    calls: Mutex<Vec<MockCall>>,
    submitted_orders: Mutex<Vec<RecordedOrder>>,
}

impl MockBroker {
    pub fn builder() -> MockBrokerBuilder {
        MockBrokerBuilder {
            equity_cents: 100_000_00,
            positions: Vec::new(),
            quotes: Vec::new(),
            signals: Some(SignalSet::default()),
            rejected: Vec::new(),
            account_fails: false,
            positions_fail: false,
            settle_on_submit: false,
        }
    }

    /// Get all orders that were submitted (for assertion in tests).
    pub fn submitted_orders(&self) -> Vec<RecordedOrder> {
        self.submitted_orders.lock().unwrap().clone()
    }

    /// Every provider call, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn settle(&self, order: &BrokerOrder) {
        let mut positions = self.positions.lock().unwrap();
        if let Some(idx) = positions
            .iter()
            .position(|p| p.symbol == order.symbol && p.side.closing_side() == Some(order.side))
        {
            let held = positions[idx].quantity;
            if order.quantity >= held {
                positions.remove(idx);
            } else {
                positions[idx].quantity = held - order.quantity;
            }
        }
    }
}

impl Brokerage for MockBroker {
    fn account(&self) -> Result<Account, BrokerError> {
        self.record(MockCall::Account);
        if self.account_fails {
            return Err(BrokerError::ProviderUnavailable("mock: account down".into()));
        }
        Ok(Account {
            equity_cents: self.equity_cents,
            cash_cents: self.equity_cents,
            buying_power_cents: self.equity_cents,
        })
    }

    fn open_positions(&self) -> Result<Vec<Position>, BrokerError> {
        self.record(MockCall::Positions);
        if self.positions_fail {
            return Err(BrokerError::ProviderUnavailable(
                "mock: positions down".into(),
            ));
        }
        Ok(self.positions.lock().unwrap().clone())
    }

    fn submit_market_order(&self, order: &BrokerOrder) -> Result<OrderAck, BrokerError> {
        ensure_positive_quantity(order)?;
        self.record(MockCall::Order(order.symbol.clone()));

        self.submitted_orders.lock().unwrap().push(RecordedOrder {
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            order_type: order.order_type,
            time_in_force: order.time_in_force,
        });

        if self.rejected.contains(&order.symbol) {
            return Err(BrokerError::OrderRejected(format!(
                "mock: {} rejected",
                order.symbol
            )));
        }

        if self.settle_on_submit {
            self.settle(order);
        }

        let mut next = self.next_order_id.lock().unwrap();
        let id = *next;
        *next += 1;
        Ok(OrderAck {
            order_id: format!("mock-{id}"),
            status: "accepted".into(),
        })
    }
}

impl QuoteSource for MockBroker {
    fn last_price(&self, symbol: &Symbol) -> Result<Price, BrokerError> {
        self.record(MockCall::Quote(symbol.clone()));
        self.quotes
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, p)| *p)
            .filter(|p| p.micros() > 0)
            .ok_or_else(|| BrokerError::QuoteUnavailable(symbol.to_string()))
    }
}

impl SignalSource for MockBroker {
    fn fetch_signals(&self) -> Result<SignalSet, BrokerError> {
        self.record(MockCall::Signals);
        self.signals
            .clone()
            .ok_or_else(|| BrokerError::ProviderUnavailable("mock: signals down".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aapl() -> Symbol {
        Symbol::new("AAPL")
    }

    #[test]
    fn builder_basic() {
        let broker = MockBroker::builder()
            .with_position(aapl(), PositionSide::Long, 100)
            .with_equity(1_000_000_00)
            .with_quote(aapl(), 150_00)
            .build();

        let positions = broker.open_positions().unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].symbol, aapl());
        assert_eq!(positions[0].quantity, 100);

        assert_eq!(broker.equity().unwrap(), 1_000_000_00);
        assert_eq!(broker.last_price(&aapl()).unwrap(), Price::from_cents(150_00));
    }

    #[test]
    fn unknown_quote_is_unavailable() {
        let broker = MockBroker::builder().build();
        assert!(matches!(
            broker.last_price(&aapl()),
            Err(BrokerError::QuoteUnavailable(_))
        ));
    }

    #[test]
    fn last_prices_isolates_failures() {
        let broker = MockBroker::builder()
            .with_quote(aapl(), 150_00)
            .with_quote(Symbol::new("MSFT"), 400_00)
            .build();
        let results = broker.last_prices(&[aapl(), Symbol::new("NOPE"), Symbol::new("MSFT")]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Ok(Price::from_cents(150_00)));
        assert!(results[1].is_err());
        assert_eq!(results[2], Ok(Price::from_cents(400_00)));
    }

    #[test]
    fn submit_records_orders() {
        let broker = MockBroker::builder().build();
        let order = BrokerOrder::market(aapl(), BrokerSide::Buy, 50).unwrap();

        let ack = broker.submit_market_order(&order).unwrap();
        assert_eq!(ack.order_id, "mock-1");

        let recorded = broker.submitted_orders();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].symbol, aapl());
        assert_eq!(recorded[0].quantity, 50);
    }

    #[test]
    fn zero_quantity_never_recorded() {
        let broker = MockBroker::builder().build();
        let order = BrokerOrder {
            symbol: aapl(),
            side: BrokerSide::Buy,
            quantity: 0,
            order_type: BrokerOrderType::Market,
            time_in_force: TimeInForce::GoodTillCanceled,
        };
        assert!(matches!(
            broker.submit_market_order(&order),
            Err(BrokerError::InvalidOrder(_))
        ));
        assert!(broker.submitted_orders().is_empty());
    }

    #[test]
    fn rejected_symbol() {
        let broker = MockBroker::builder().reject_orders_for(aapl()).build();
        let order = BrokerOrder::market(aapl(), BrokerSide::Sell, 5).unwrap();
        assert!(matches!(
            broker.submit_market_order(&order),
            Err(BrokerError::OrderRejected(_))
        ));
        // Still recorded as an attempt
        assert_eq!(broker.submitted_orders().len(), 1);
    }

    #[test]
    fn settle_on_submit_closes_position() {
        let broker = MockBroker::builder()
            .with_position(aapl(), PositionSide::Long, 10)
            .settle_on_submit()
            .build();
        let order = BrokerOrder::market(aapl(), BrokerSide::Sell, 10).unwrap();
        broker.submit_market_order(&order).unwrap();
        assert!(broker.open_positions().unwrap().is_empty());
    }

    #[test]
    fn missing_signals_fail() {
        let broker = MockBroker::builder().without_signals().build();
        assert!(matches!(
            broker.fetch_signals(),
            Err(BrokerError::ProviderUnavailable(_))
        ));
    }
}
