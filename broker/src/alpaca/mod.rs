//! Alpaca brokerage implementation.

pub mod client;
pub mod types;

use std::time::Duration;

use log::debug;

use crate::error::BrokerError;
use crate::http;
use crate::types::*;
use crate::{Brokerage, ensure_positive_quantity};
use client::AlpacaClient;
use types::{AccountResponse, OrderRequest, OrderResponse, PositionResponse};

/// Paper-trading endpoint.
pub const PAPER_URL: &str = "https://paper-api.alpaca.markets";

/// Alpaca account implementing the generic `Brokerage` trait.
///
/// Uses the REST API for all operations. Blocking (sync) via reqwest::blocking.
pub struct AlpacaBroker {
    client: AlpacaClient,
}

impl AlpacaBroker {
    pub fn new(
        base_url: &str,
        key_id: &str,
        secret_key: &str,
        timeout: Duration,
    ) -> Result<Self, BrokerError> {
        Ok(Self {
            client: AlpacaClient::new(base_url, key_id, secret_key, timeout)?,
        })
    }
}

impl Brokerage for AlpacaBroker {
    fn account(&self) -> Result<Account, BrokerError> {
        to_account(&self.client.account()?)
    }

    fn open_positions(&self) -> Result<Vec<Position>, BrokerError> {
        to_positions(&self.client.positions()?)
    }

    fn submit_market_order(&self, order: &BrokerOrder) -> Result<OrderAck, BrokerError> {
        ensure_positive_quantity(order)?;
        let request = OrderRequest {
            symbol: order.symbol.as_str(),
            qty: order.quantity,
            side: order.side.as_str(),
            order_type: order.order_type.as_str(),
            time_in_force: order.time_in_force.as_str(),
        };
        Ok(to_ack(self.client.submit_order(&request)?))
    }
}

/// Convert an account response. Equity is required; cash and buying power
/// default to zero when absent.
pub fn to_account(resp: &AccountResponse) -> Result<Account, BrokerError> {
    let equity_cents = resp
        .equity
        .as_ref()
        .and_then(http::decimal_cents)
        .ok_or_else(|| {
            BrokerError::MalformedResponse(format!(
                "account: equity missing or non-numeric ({:?})",
                resp.equity
            ))
        })?;
    let optional = |v: &Option<serde_json::Value>| v.as_ref().and_then(http::decimal_cents).unwrap_or(0);

    Ok(Account {
        equity_cents,
        cash_cents: optional(&resp.cash),
        buying_power_cents: optional(&resp.buying_power),
    })
}

/// Convert position entries. Unknown sides are kept as `Flat`; quantities are
/// absolute whole shares.
pub fn to_positions(entries: &[PositionResponse]) -> Result<Vec<Position>, BrokerError> {
    entries
        .iter()
        .map(|p| {
            let symbol = Symbol::try_new(&p.symbol).ok_or_else(|| {
                BrokerError::MalformedResponse(format!("position with invalid symbol {:?}", p.symbol))
            })?;
            let qty = http::decimal(&p.qty).ok_or_else(|| {
                BrokerError::MalformedResponse(format!("position {symbol}: non-numeric qty {}", p.qty))
            })?;
            let whole = qty.abs().trunc();
            if whole != qty.abs() {
                debug!("position {symbol}: fractional qty {qty} truncated to {whole}");
            }
            Ok(Position {
                symbol,
                side: PositionSide::parse(&p.side),
                quantity: whole as u64,
            })
        })
        .collect()
}

fn to_ack(resp: OrderResponse) -> OrderAck {
    OrderAck {
        order_id: resp.id,
        status: resp.status,
    }
}
