//! JSONL audit trail logging.
//!
//! Each rebalancer run appends events to the configured audit file,
//! one JSON object per line. With no file configured the log is a no-op.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use signal_broker::{Position, SignalSet, Symbol};

use crate::error::Result;
use crate::summary::{OrderAttempt, QuoteFailure, RunSummary, Skipped};

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: Option<BufWriter<std::fs::File>>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
        })
    }

    /// A log that records nothing.
    pub fn disabled() -> Self {
        Self { writer: None }
    }

    /// Open `path` if given, otherwise a disabled log.
    pub fn open_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::open(p),
            None => Ok(Self::disabled()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
        writer.flush()?;
        Ok(())
    }
}

fn symbols(list: &[Symbol]) -> Vec<&str> {
    list.iter().map(Symbol::as_str).collect()
}

/// Convenience: log a run start event.
pub fn log_run_started(
    audit: &mut AuditLog,
    leverage_bps: u32,
    slots_per_side: u32,
    dry_run: bool,
) -> Result<()> {
    audit.log(
        "run_started",
        serde_json::json!({
            "leverage": leverage_bps as f64 / 10_000.0,
            "slots_per_side": slots_per_side,
            "dry_run": dry_run,
        }),
    )
}

/// Convenience: log the signal set.
pub fn log_signals(audit: &mut AuditLog, signals: &SignalSet) -> Result<()> {
    audit.log(
        "signals_fetched",
        serde_json::json!({
            "long": symbols(&signals.long_symbols),
            "short": symbols(&signals.short_symbols),
        }),
    )
}

/// Convenience: log positions fetched.
pub fn log_positions(audit: &mut AuditLog, positions: &[Position]) -> Result<()> {
    let pos_data: Vec<_> = positions
        .iter()
        .map(|p| {
            serde_json::json!({
                "symbol": p.symbol.as_str(),
                "side": p.side.as_str(),
                "qty": p.quantity,
            })
        })
        .collect();

    audit.log("positions_fetched", serde_json::json!({ "positions": pos_data }))
}

/// Convenience: log one order attempt with its outcome.
pub fn log_order(audit: &mut AuditLog, attempt: &OrderAttempt) -> Result<()> {
    let mut data = serde_json::json!({
        "phase": attempt.phase.as_str(),
        "symbol": attempt.symbol.as_str(),
        "side": attempt.side.as_str(),
        "qty": attempt.quantity,
    });
    match &attempt.result {
        Ok(ack) => {
            data["order_id"] = ack.order_id.clone().into();
            data["status"] = ack.status.clone().into();
        }
        Err(e) => {
            data["error"] = e.kind().into();
            data["detail"] = e.to_string().into();
        }
    }
    audit.log("order_attempted", data)
}

/// Convenience: log a failed quote lookup.
pub fn log_quote_failure(audit: &mut AuditLog, failure: &QuoteFailure) -> Result<()> {
    audit.log(
        "quote_failed",
        serde_json::json!({
            "symbol": failure.symbol.as_str(),
            "leg": failure.leg.as_str(),
            "detail": failure.error.to_string(),
        }),
    )
}

/// Convenience: log a skipped symbol.
pub fn log_skipped(audit: &mut AuditLog, skipped: &Skipped) -> Result<()> {
    audit.log(
        "symbol_skipped",
        serde_json::json!({
            "phase": skipped.phase.as_str(),
            "symbol": skipped.symbol.as_str(),
            "reason": skipped.reason.to_string(),
        }),
    )
}

/// Convenience: log the equity used for sizing.
pub fn log_equity(audit: &mut AuditLog, equity_cents: i64) -> Result<()> {
    audit.log(
        "equity_read",
        serde_json::json!({ "equity": equity_cents as f64 / 100.0 }),
    )
}

/// Convenience: log run completion.
pub fn log_run_completed(audit: &mut AuditLog, summary: &RunSummary) -> Result<()> {
    audit.log(
        "run_completed",
        serde_json::json!({
            "submitted": summary.submitted(),
            "accepted": summary.accepted(),
            "failures": summary.failures(),
            "skipped": summary.skipped.len(),
        }),
    )
}
