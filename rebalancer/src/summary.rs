//! Structured outcome of a rebalance run.

use std::fmt;

use signal_broker::{BrokerError, BrokerSide, OrderAck, PositionSide, Price, SignalSet, Symbol};

/// Phase in which an order was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Liquidation,
    Opening,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Liquidation => "liquidation",
            Phase::Opening => "opening",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted order and what the brokerage said about it.
#[derive(Debug, Clone)]
pub struct OrderAttempt {
    pub phase: Phase,
    pub symbol: Symbol,
    pub side: BrokerSide,
    pub quantity: u64,
    pub result: Result<OrderAck, BrokerError>,
}

/// A target symbol that never reached order submission because its price
/// could not be read.
#[derive(Debug, Clone)]
pub struct QuoteFailure {
    pub symbol: Symbol,
    pub leg: PositionSide,
    pub error: BrokerError,
}

/// Why a symbol produced no order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Open position reported as neither long nor short.
    FlatPosition,
    /// Open position with nothing to close.
    EmptyPosition,
    /// Slot allocation buys less than one share.
    TooSmall { price: Price },
    /// Beyond the configured slots for its side.
    OverBudget,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FlatPosition => write!(f, "flat position"),
            SkipReason::EmptyPosition => write!(f, "zero quantity"),
            SkipReason::TooSmall { price } => write!(f, "under one share at {price}"),
            SkipReason::OverBudget => write!(f, "no slot left on this side"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Skipped {
    pub phase: Phase,
    pub symbol: Symbol,
    pub reason: SkipReason,
}

/// Everything a run did, for callers that inspect outcomes instead of logs.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub signals: SignalSet,
    pub orders: Vec<OrderAttempt>,
    pub quote_failures: Vec<QuoteFailure>,
    pub skipped: Vec<Skipped>,
    /// Equity used for sizing, when it could be read.
    pub equity_cents: Option<i64>,
    /// Why the opening phase did not run, if it did not.
    pub equity_error: Option<BrokerError>,
}

impl RunSummary {
    pub fn new(signals: SignalSet) -> Self {
        Self {
            signals,
            orders: Vec::new(),
            quote_failures: Vec::new(),
            skipped: Vec::new(),
            equity_cents: None,
            equity_error: None,
        }
    }

    /// Orders of one phase, in submission order.
    pub fn phase_orders(&self, phase: Phase) -> impl Iterator<Item = &OrderAttempt> {
        self.orders.iter().filter(move |o| o.phase == phase)
    }

    pub fn submitted(&self) -> usize {
        self.orders.len()
    }

    pub fn accepted(&self) -> usize {
        self.orders.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn rejected(&self) -> usize {
        self.orders.iter().filter(|o| o.result.is_err()).count()
    }

    /// Rejected orders, failed quotes and an unreadable equity all count.
    pub fn failures(&self) -> usize {
        self.rejected() + self.quote_failures.len() + usize::from(self.equity_error.is_some())
    }

    pub fn is_clean(&self) -> bool {
        self.failures() == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "REBALANCE SUMMARY:")?;
        match self.equity_cents {
            Some(eq) => writeln!(f, "  Equity used for sizing: ${:.2}", eq as f64 / 100.0)?,
            None => writeln!(f, "  Equity used for sizing: n/a")?,
        }
        writeln!(
            f,
            "  {:12} {:8} {:5} {:>8}  {}",
            "Phase", "Symbol", "Side", "Qty", "Outcome"
        )?;
        for o in &self.orders {
            let outcome = match &o.result {
                Ok(ack) => format!("{} ({})", ack.status, ack.order_id),
                Err(e) => format!("FAILED: {e}"),
            };
            writeln!(
                f,
                "  {:12} {:8} {:5} {:>8}  {}",
                o.phase.as_str(),
                o.symbol.as_str(),
                o.side.as_str(),
                o.quantity,
                outcome
            )?;
        }
        for q in &self.quote_failures {
            writeln!(f, "  no quote     {:8} ({} leg): {}", q.symbol.as_str(), q.leg, q.error)?;
        }
        for s in &self.skipped {
            writeln!(f, "  skipped      {:8} ({}): {}", s.symbol.as_str(), s.phase, s.reason)?;
        }
        if let Some(e) = &self.equity_error {
            writeln!(f, "  opening phase not run: {e}")?;
        }
        writeln!(
            f,
            "\n  Completed with {} failures ({} orders submitted, {} accepted).",
            self.failures(),
            self.submitted(),
            self.accepted()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(phase: Phase, sym: &str, ok: bool) -> OrderAttempt {
        OrderAttempt {
            phase,
            symbol: Symbol::new(sym),
            side: BrokerSide::Buy,
            quantity: 10,
            result: if ok {
                Ok(OrderAck {
                    order_id: "1".into(),
                    status: "accepted".into(),
                })
            } else {
                Err(BrokerError::OrderRejected("market closed".into()))
            },
        }
    }

    #[test]
    fn counts_failures_across_kinds() {
        let mut summary = RunSummary::new(SignalSet::default());
        summary.orders.push(attempt(Phase::Liquidation, "TSLA", true));
        summary.orders.push(attempt(Phase::Opening, "AAPL", false));
        summary.quote_failures.push(QuoteFailure {
            symbol: Symbol::new("MSFT"),
            leg: PositionSide::Long,
            error: BrokerError::QuoteUnavailable("MSFT".into()),
        });

        assert_eq!(summary.submitted(), 2);
        assert_eq!(summary.accepted(), 1);
        assert_eq!(summary.failures(), 2);
        assert!(!summary.is_clean());
        assert_eq!(summary.phase_orders(Phase::Opening).count(), 1);
    }

    #[test]
    fn display_format() {
        let mut summary = RunSummary::new(SignalSet::default());
        summary.equity_cents = Some(100_000_00);
        summary.orders.push(attempt(Phase::Opening, "AAPL", true));
        summary.skipped.push(Skipped {
            phase: Phase::Opening,
            symbol: Symbol::new("BRK.A"),
            reason: SkipReason::TooSmall {
                price: Price::from_cents(620_000_00),
            },
        });
        let s = format!("{summary}");
        assert!(s.contains("AAPL"));
        assert!(s.contains("BRK.A"));
        assert!(s.contains("under one share at $620000.00"));
        assert!(s.contains("$100000.00"));
        assert!(s.contains("Completed with 0 failures"));
    }
}
