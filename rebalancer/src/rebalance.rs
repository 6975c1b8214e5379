//! The daily rebalance: snapshot, liquidate everything, reopen target slots.
//!
//! Phases always run in this order:
//!
//! 1. **Snapshot**: read the signal set and the open positions. Any failure
//!    here aborts the run before a single order is sent.
//! 2. **Liquidation**: close every long/short position with an opposing
//!    market order.
//! 3. **Opening**: re-read equity (so freed capital is counted), then buy
//!    each long signal and sell each short signal, one slot each.
//!
//! Failures in phases 2 and 3 are per symbol and end up in the
//! [`RunSummary`]; the batch always continues.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use rustc_hash::FxHashSet;
use signal_broker::{
    BrokerError, BrokerOrder, Brokerage, Position, PositionSide, QuoteSource, SignalSet,
    SignalSource, Symbol,
};

use crate::audit::{self, AuditLog};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::sizing;
use crate::summary::{OrderAttempt, Phase, QuoteFailure, RunSummary, SkipReason, Skipped};

/// Sizing and pacing knobs for one run.
#[derive(Debug, Clone)]
pub struct RebalanceParams {
    pub leverage_bps: u32,
    pub slots_per_side: u32,
    /// Pause between consecutive order submissions.
    pub order_interval: Duration,
    /// How long to wait for liquidations to disappear before reading equity.
    pub settle_timeout: Duration,
    pub settle_poll: Duration,
}

impl Default for RebalanceParams {
    fn default() -> Self {
        Self {
            leverage_bps: 9_000,
            slots_per_side: 5,
            order_interval: Duration::ZERO,
            settle_timeout: Duration::ZERO,
            settle_poll: Duration::from_secs(1),
        }
    }
}

impl RebalanceParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            leverage_bps: config.sizing.leverage_bps(),
            slots_per_side: config.sizing.slots_per_side,
            order_interval: Duration::from_millis(config.execution.order_interval_ms),
            settle_timeout: Duration::from_secs(config.execution.settle_timeout_secs),
            settle_poll: Duration::from_millis(config.execution.settle_poll_ms),
        }
    }
}

/// Spaces out order submissions; the first one goes immediately.
struct Pacer {
    interval: Duration,
    primed: bool,
}

impl Pacer {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            primed: false,
        }
    }

    fn wait(&mut self) {
        if self.primed && !self.interval.is_zero() {
            thread::sleep(self.interval);
        }
        self.primed = true;
    }
}

/// Runs the three phases against injected providers.
pub struct Rebalancer<'a> {
    brokerage: &'a dyn Brokerage,
    quotes: &'a dyn QuoteSource,
    signals: &'a dyn SignalSource,
    params: RebalanceParams,
}

impl<'a> Rebalancer<'a> {
    pub fn new(
        brokerage: &'a dyn Brokerage,
        quotes: &'a dyn QuoteSource,
        signals: &'a dyn SignalSource,
        params: RebalanceParams,
    ) -> Self {
        Self {
            brokerage,
            quotes,
            signals,
            params,
        }
    }

    pub fn params(&self) -> &RebalanceParams {
        &self.params
    }

    /// Execute one rebalance.
    ///
    /// Returns `Err` only for a Snapshot-phase failure (nothing was sent) or
    /// an audit write failure before the first order. Everything after that
    /// is reported through the summary.
    pub fn run(&self, audit: &mut AuditLog) -> Result<RunSummary> {
        info!("Snapshot: fetching signals");
        let signals = self
            .signals
            .fetch_signals()
            .map_err(|source| snapshot_failed("signals", source))?;
        info!(
            "Signals: {} long {:?}, {} short {:?}",
            signals.long_symbols.len(),
            symbol_strs(&signals.long_symbols),
            signals.short_symbols.len(),
            symbol_strs(&signals.short_symbols),
        );

        info!("Snapshot: fetching open positions");
        let positions = self
            .brokerage
            .open_positions()
            .map_err(|source| snapshot_failed("positions", source))?;

        audit::log_signals(audit, &signals)?;
        audit::log_positions(audit, &positions)?;

        let mut summary = RunSummary::new(signals.clone());
        let mut pacer = Pacer::new(self.params.order_interval);

        let closed = self.liquidate(&positions, &mut summary, &mut pacer, audit);
        self.await_settlement(&closed);

        match self.brokerage.equity() {
            Ok(equity_cents) => {
                summary.equity_cents = Some(equity_cents);
                note(audit::log_equity(audit, equity_cents));
                self.open_targets(&signals, equity_cents, &mut summary, &mut pacer, audit);
            }
            Err(e) => {
                error!("Could not read equity; opening phase skipped: {e}");
                summary.equity_error = Some(e);
            }
        }

        note(audit::log_run_completed(audit, &summary));
        info!(
            "Run completed with {} failures ({} orders submitted)",
            summary.failures(),
            summary.submitted()
        );
        Ok(summary)
    }

    /// Close every long/short position. Returns the positions whose closing
    /// order was accepted.
    fn liquidate(
        &self,
        positions: &[Position],
        summary: &mut RunSummary,
        pacer: &mut Pacer,
        audit: &mut AuditLog,
    ) -> Vec<Position> {
        info!("Liquidation: {} open positions", positions.len());
        let mut closed = Vec::new();

        for pos in positions {
            let Some(side) = pos.side.closing_side() else {
                skip(summary, audit, Phase::Liquidation, &pos.symbol, SkipReason::FlatPosition);
                continue;
            };
            let Some(order) = BrokerOrder::market(pos.symbol.clone(), side, pos.quantity) else {
                skip(summary, audit, Phase::Liquidation, &pos.symbol, SkipReason::EmptyPosition);
                continue;
            };

            let attempt = self.submit(Phase::Liquidation, order, pacer);
            if attempt.result.is_ok() {
                closed.push(pos.clone());
            }
            note(audit::log_order(audit, &attempt));
            summary.orders.push(attempt);
        }

        closed
    }

    /// Poll positions until every closed one is gone, or the wait expires.
    fn await_settlement(&self, closed: &[Position]) {
        let timeout = self.params.settle_timeout;
        if timeout.is_zero() || closed.is_empty() {
            return;
        }

        let pending: FxHashSet<(&Symbol, PositionSide)> =
            closed.iter().map(|p| (&p.symbol, p.side)).collect();
        let deadline = Instant::now() + timeout;
        info!("Waiting up to {timeout:?} for {} liquidations to settle", pending.len());

        loop {
            match self.brokerage.open_positions() {
                Ok(now) => {
                    let open = now
                        .iter()
                        .filter(|p| pending.contains(&(&p.symbol, p.side)))
                        .count();
                    if open == 0 {
                        info!("Liquidations settled");
                        return;
                    }
                    debug!("{open} liquidated positions still open");
                }
                Err(e) => warn!("Settlement poll failed: {e}"),
            }

            if Instant::now() >= deadline {
                warn!("Liquidations not settled after {timeout:?}; sizing with current equity");
                return;
            }
            thread::sleep(self.params.settle_poll);
        }
    }

    fn open_targets(
        &self,
        signals: &SignalSet,
        equity_cents: i64,
        summary: &mut RunSummary,
        pacer: &mut Pacer,
        audit: &mut AuditLog,
    ) {
        let slots = self.params.slots_per_side;
        let slot_cents = sizing::slot_allocation_cents(equity_cents, self.params.leverage_bps, slots);
        info!(
            "Opening: equity ${:.2}, ${:.2} per slot, {slots} slots per side",
            equity_cents as f64 / 100.0,
            slot_cents as f64 / 100.0,
        );

        for leg in [PositionSide::Long, PositionSide::Short] {
            let Some(side) = leg.opening_side() else {
                continue;
            };
            let listed = signals.side(leg);
            let (funded, unfunded) = listed.split_at(listed.len().min(slots as usize));

            let prices = self.quotes.last_prices(funded);
            for (symbol, price) in funded.iter().zip(prices) {
                let price = match price {
                    Ok(p) => p,
                    Err(error) => {
                        warn!("{leg} {symbol}: quote failed: {error}");
                        let failure = QuoteFailure {
                            symbol: symbol.clone(),
                            leg,
                            error,
                        };
                        note(audit::log_quote_failure(audit, &failure));
                        summary.quote_failures.push(failure);
                        continue;
                    }
                };

                let qty = sizing::target_quantity(
                    equity_cents,
                    self.params.leverage_bps,
                    slots,
                    price,
                );
                let Some(order) = BrokerOrder::market(symbol.clone(), side, qty) else {
                    skip(summary, audit, Phase::Opening, symbol, SkipReason::TooSmall { price });
                    continue;
                };

                let attempt = self.submit(Phase::Opening, order, pacer);
                note(audit::log_order(audit, &attempt));
                summary.orders.push(attempt);
            }

            for symbol in unfunded {
                skip(summary, audit, Phase::Opening, symbol, SkipReason::OverBudget);
            }
        }
    }

    fn submit(&self, phase: Phase, order: BrokerOrder, pacer: &mut Pacer) -> OrderAttempt {
        pacer.wait();
        let result = self.brokerage.submit_market_order(&order);
        match &result {
            Ok(ack) => info!(
                "{phase}: {} {} {} -> {} ({})",
                order.side, order.quantity, order.symbol, ack.status, ack.order_id
            ),
            Err(e) => warn!(
                "{phase}: {} {} {} -> FAILED: {e}",
                order.side, order.quantity, order.symbol
            ),
        }
        OrderAttempt {
            phase,
            symbol: order.symbol,
            side: order.side,
            quantity: order.quantity,
            result,
        }
    }
}

fn snapshot_failed(stage: &'static str, source: BrokerError) -> Error {
    error!("Snapshot failed fetching {stage}: {source}; no orders attempted");
    Error::Snapshot { stage, source }
}

fn skip(
    summary: &mut RunSummary,
    audit: &mut AuditLog,
    phase: Phase,
    symbol: &Symbol,
    reason: SkipReason,
) {
    info!("{phase}: skipping {symbol} ({reason})");
    let skipped = Skipped {
        phase,
        symbol: symbol.clone(),
        reason,
    };
    note(audit::log_skipped(audit, &skipped));
    summary.skipped.push(skipped);
}

/// Audit writes after the first order never stop the batch.
fn note(result: Result<()>) {
    if let Err(e) = result {
        warn!("audit write failed: {e}");
    }
}

fn symbol_strs(list: &[Symbol]) -> Vec<&str> {
    list.iter().map(Symbol::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_broker::mock::{MockBroker, MockCall};
    use signal_broker::BrokerSide;

    fn run(broker: &MockBroker, params: RebalanceParams) -> Result<RunSummary> {
        Rebalancer::new(broker, broker, broker, params).run(&mut AuditLog::disabled())
    }

    #[test]
    fn equity_read_after_liquidation() {
        let broker = MockBroker::builder()
            .with_position(Symbol::new("TSLA"), PositionSide::Short, 10)
            .with_quote(Symbol::new("AAPL"), 180_00)
            .with_signals(&["AAPL"], &[])
            .build();

        run(&broker, RebalanceParams::default()).unwrap();

        let calls = broker.calls();
        let liquidation = calls
            .iter()
            .position(|c| *c == MockCall::Order(Symbol::new("TSLA")))
            .unwrap();
        let account = calls.iter().position(|c| *c == MockCall::Account).unwrap();
        let opening = calls
            .iter()
            .position(|c| *c == MockCall::Order(Symbol::new("AAPL")))
            .unwrap();
        assert_eq!(calls[0], MockCall::Signals);
        assert_eq!(calls[1], MockCall::Positions);
        assert!(liquidation < account);
        assert!(account < opening);
    }

    #[test]
    fn over_budget_symbols_are_skipped() {
        let broker = MockBroker::builder()
            .with_quote(Symbol::new("AAA"), 10_00)
            .with_quote(Symbol::new("BBB"), 10_00)
            .with_quote(Symbol::new("CCC"), 10_00)
            .with_signals(&["AAA", "BBB", "CCC"], &[])
            .build();
        let params = RebalanceParams {
            slots_per_side: 2,
            ..RebalanceParams::default()
        };

        let summary = run(&broker, params).unwrap();

        assert_eq!(summary.submitted(), 2);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].symbol, Symbol::new("CCC"));
        assert_eq!(summary.skipped[0].reason, SkipReason::OverBudget);
        // CCC was never quoted
        assert!(!broker.calls().contains(&MockCall::Quote(Symbol::new("CCC"))));
    }

    #[test]
    fn settlement_wait_sees_closed_positions() {
        let broker = MockBroker::builder()
            .with_position(Symbol::new("MSFT"), PositionSide::Long, 5)
            .settle_on_submit()
            .build();
        let params = RebalanceParams {
            settle_timeout: Duration::from_secs(5),
            settle_poll: Duration::from_millis(1),
            ..RebalanceParams::default()
        };

        let summary = run(&broker, params).unwrap();

        assert_eq!(summary.orders[0].side, BrokerSide::Sell);
        // Snapshot read + one settlement poll that finds nothing open
        let polls = broker
            .calls()
            .iter()
            .filter(|c| **c == MockCall::Positions)
            .count();
        assert_eq!(polls, 2);
    }

    #[test]
    fn settlement_wait_gives_up_after_timeout() {
        let broker = MockBroker::builder()
            .with_position(Symbol::new("MSFT"), PositionSide::Long, 5)
            .build();
        let params = RebalanceParams {
            settle_timeout: Duration::from_millis(20),
            settle_poll: Duration::from_millis(5),
            ..RebalanceParams::default()
        };

        let summary = run(&broker, params).unwrap();

        // Still proceeds to read equity
        assert_eq!(summary.equity_cents, Some(100_000_00));
    }

    #[test]
    fn pacer_skips_first_wait() {
        let mut pacer = Pacer::new(Duration::from_millis(50));
        let start = Instant::now();
        pacer.wait();
        assert!(start.elapsed() < Duration::from_millis(50));
        pacer.wait();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
