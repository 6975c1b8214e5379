//! CLI entry point for the signal rebalancer.
//!
//! With no arguments it loads `config.toml` (or the defaults, if there is no
//! such file) and runs one rebalance, which is what a daily scheduler invokes.
//!
//! Exit codes: 0 when a run completes, even with per-symbol failures; 1 on
//! config or provider setup errors; 2 when the snapshot failed and no order
//! was sent.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use signal_rebalancer::config::Config;
use signal_rebalancer::execution::{self, RunOptions};

const DEFAULT_CONFIG: &str = "config.toml";

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Daily rebalancer: market signals → brokerage")]
#[command(version)]
struct Cli {
    /// Path to the config file [default: config.toml, optional]
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Liquidate all positions and open the latest signals (default)
    Run {
        /// Log orders without submitting them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show current brokerage positions
    Positions,

    /// Check brokerage connection
    Status,

    /// Show the current signal set
    Signals,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::load_or_default(Path::new(DEFAULT_CONFIG)),
    };
    let mut config = match loaded {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };
    config.apply_env_overrides(|key| std::env::var(key).ok());

    let command = cli.command.unwrap_or(Command::Run { dry_run: false });
    let result = match command {
        Command::Run { dry_run } => {
            execution::run(&config, &RunOptions { dry_run }).map(|summary| print!("\n{summary}"))
        }
        Command::Positions => execution::show_positions(&config),
        Command::Status => execution::check_status(&config),
        Command::Signals => execution::show_signals(&config),
    };

    if let Err(e) = result {
        if e.is_pre_trade_abort() {
            eprintln!("\nAborted before any order: {e}");
        } else {
            eprintln!("Error: {e}");
        }
        process::exit(e.exit_code());
    }
}
