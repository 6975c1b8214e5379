//! Command workflows: rebalance run, position listing, status and signal checks.

use signal_broker::{Account, Position, SignalSet};

use crate::audit::{self, AuditLog};
use crate::broker;
use crate::config::Config;
use crate::error::Result;
use crate::rebalance::{RebalanceParams, Rebalancer};
use crate::summary::RunSummary;

/// Options for a rebalance run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,
}

/// Connect to every provider and execute one rebalance.
pub fn run(config: &Config, opts: &RunOptions) -> Result<RunSummary> {
    let providers = broker::connect(config, opts.dry_run)?;

    let mut audit = AuditLog::open_optional(config.logging.audit_file.as_deref())?;
    let params = RebalanceParams::from_config(config);
    audit::log_run_started(
        &mut audit,
        params.leverage_bps,
        params.slots_per_side,
        opts.dry_run,
    )?;

    if opts.dry_run {
        println!("[DRY RUN] Orders will be logged, not submitted.");
    }

    let rebalancer = Rebalancer::new(
        providers.brokerage.as_ref(),
        providers.quotes.as_ref(),
        providers.signals.as_ref(),
        params,
    );
    rebalancer.run(&mut audit)
}

/// Show current brokerage positions.
pub fn show_positions(config: &Config) -> Result<()> {
    let brokerage = broker::connect_brokerage(config, false)?;
    let account = brokerage.account()?;
    let positions = brokerage.open_positions()?;

    display_account(&account);
    println!();
    display_positions(&positions);
    Ok(())
}

/// Check brokerage connectivity.
pub fn check_status(config: &Config) -> Result<()> {
    print!("Connecting to brokerage at {}... ", config.brokerage.base_url);

    let brokerage = broker::connect_brokerage(config, false)?;
    let account = brokerage.account()?;
    println!("OK");

    display_account(&account);
    Ok(())
}

/// Fetch and print the current signal set without trading.
pub fn show_signals(config: &Config) -> Result<()> {
    let signals = broker::connect_signals(config)?.fetch_signals()?;
    display_signals(&signals);
    Ok(())
}

// === Helpers ===

fn display_account(account: &Account) {
    println!(
        "Account: ${:.2} equity, ${:.2} cash, ${:.2} buying power",
        account.equity_cents as f64 / 100.0,
        account.cash_cents as f64 / 100.0,
        account.buying_power_cents as f64 / 100.0,
    );
}

fn display_positions(positions: &[Position]) {
    if positions.is_empty() {
        println!("No positions.");
        return;
    }

    println!("OPEN POSITIONS:");
    for pos in positions {
        println!("  {:8} {:5} {:>8}", pos.symbol.as_str(), pos.side.as_str(), pos.quantity);
    }
}

fn display_signals(signals: &SignalSet) {
    let join = |list: &[signal_broker::Symbol]| {
        list.iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("LONG:  {}", join(signals.long_symbols.as_slice()));
    println!("SHORT: {}", join(signals.short_symbols.as_slice()));
}
