//! Provider wiring: builds the brokerage, quote and signal clients from config.

use signal_broker::alpaca::AlpacaBroker;
use signal_broker::dry_run::DryRunBroker;
use signal_broker::iex::IexQuotes;
use signal_broker::rapidapi::MarketSignals;
use signal_broker::{Brokerage, QuoteSource, SignalSource};

use crate::config::Config;
use crate::error::Result;

/// The three collaborators of a run, boxed behind their traits.
pub struct Providers {
    pub brokerage: Box<dyn Brokerage>,
    pub quotes: Box<dyn QuoteSource>,
    pub signals: Box<dyn SignalSource>,
}

/// Build REST clients for every provider. With `dry_run`, the brokerage
/// still reads live state but orders are only logged.
pub fn connect(config: &Config, dry_run: bool) -> Result<Providers> {
    config.require_credentials()?;
    Ok(Providers {
        brokerage: connect_brokerage(config, dry_run)?,
        quotes: connect_quotes(config)?,
        signals: connect_signals(config)?,
    })
}

pub fn connect_brokerage(config: &Config, dry_run: bool) -> Result<Box<dyn Brokerage>> {
    let alpaca = AlpacaBroker::new(
        &config.brokerage.base_url,
        &config.brokerage.api_key_id,
        &config.brokerage.api_secret_key,
        config.timeout(),
    )?;
    if dry_run {
        Ok(Box::new(DryRunBroker::new(alpaca)))
    } else {
        Ok(Box::new(alpaca))
    }
}

pub fn connect_quotes(config: &Config) -> Result<Box<dyn QuoteSource>> {
    let quotes = IexQuotes::new(&config.quotes.base_url, &config.quotes.token, config.timeout())?;
    Ok(Box::new(quotes))
}

pub fn connect_signals(config: &Config) -> Result<Box<dyn SignalSource>> {
    let signals = MarketSignals::new(
        &config.signals.url,
        &config.signals.host,
        &config.signals.api_key,
        config.timeout(),
    )?;
    Ok(Box::new(signals))
}
