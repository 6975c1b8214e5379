//! Provider traits and implementations for signal-rebalancer.
//!
//! Three collaborators feed a rebalance run:
//!
//! - [`Brokerage`]: account equity, open positions and order placement
//! - [`QuoteSource`]: last trade price per symbol
//! - [`SignalSource`]: the target long/short portfolio
//!
//! Implementations:
//!
//! - **Alpaca** (feature `alpaca`): brokerage via the Alpaca v2 REST API
//! - **IEX Cloud** (feature `iex`): quotes via the `tops` endpoint
//! - **RapidAPI** (feature `rapidapi`): the "market signals" portfolio feed

pub mod dry_run;
pub mod error;
pub mod mock;
pub mod types;

#[cfg(any(feature = "alpaca", feature = "iex", feature = "rapidapi"))]
mod http;

#[cfg(feature = "alpaca")]
pub mod alpaca;

#[cfg(feature = "iex")]
pub mod iex;

#[cfg(feature = "rapidapi")]
pub mod rapidapi;

pub use error::BrokerError;
#[cfg(any(feature = "alpaca", feature = "iex", feature = "rapidapi"))]
pub use http::classify_read_response;
pub use types::*;

/// A brokerage account that can report its state and accept orders.
pub trait Brokerage {
    /// Get the account summary (equity, cash, buying power).
    fn account(&self) -> Result<Account, BrokerError>;

    /// Current account equity in cents.
    fn equity(&self) -> Result<i64, BrokerError> {
        self.account().map(|a| a.equity_cents)
    }

    /// All open positions. An empty account is an empty Vec, not an error.
    fn open_positions(&self) -> Result<Vec<Position>, BrokerError>;

    /// Submit a market order. `order.quantity` must be positive.
    fn submit_market_order(&self, order: &BrokerOrder) -> Result<OrderAck, BrokerError>;
}

/// Latest trade prices.
pub trait QuoteSource {
    /// Last trade price. Always positive on success.
    fn last_price(&self, symbol: &Symbol) -> Result<Price, BrokerError>;

    /// One result per input symbol, in input order. A failure for one symbol
    /// never affects the others.
    fn last_prices(&self, symbols: &[Symbol]) -> Vec<Result<Price, BrokerError>> {
        symbols.iter().map(|s| self.last_price(s)).collect()
    }
}

/// Source of the target portfolio.
pub trait SignalSource {
    fn fetch_signals(&self) -> Result<SignalSet, BrokerError>;
}

/// Reject orders that violate the positive-quantity precondition.
pub(crate) fn ensure_positive_quantity(order: &BrokerOrder) -> Result<(), BrokerError> {
    if order.quantity == 0 {
        return Err(BrokerError::InvalidOrder(format!(
            "{} {} with zero quantity",
            order.side, order.symbol
        )));
    }
    Ok(())
}
