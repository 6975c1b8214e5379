//! Brokerage wrapper that reads live state but never places orders.

use std::sync::atomic::{AtomicU64, Ordering};

use log::info;

use crate::error::BrokerError;
use crate::types::{Account, BrokerOrder, OrderAck, Position};
use crate::{Brokerage, ensure_positive_quantity};

/// Delegates account and position reads to `inner`; acknowledges orders
/// locally with status `dry_run`.
pub struct DryRunBroker<B> {
    inner: B,
    counter: AtomicU64,
}

impl<B: Brokerage> DryRunBroker<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            counter: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: Brokerage> Brokerage for DryRunBroker<B> {
    fn account(&self) -> Result<Account, BrokerError> {
        self.inner.account()
    }

    fn open_positions(&self) -> Result<Vec<Position>, BrokerError> {
        self.inner.open_positions()
    }

    fn submit_market_order(&self, order: &BrokerOrder) -> Result<OrderAck, BrokerError> {
        ensure_positive_quantity(order)?;
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            "[DRY RUN] would submit {} {} {} {} {}",
            order.side,
            order.quantity,
            order.symbol,
            order.order_type.as_str(),
            order.time_in_force.as_str(),
        );
        Ok(OrderAck {
            order_id: format!("dry-run-{n}"),
            status: "dry_run".into(),
        })
    }
}
