//! Signal provider: the "market signals" neutral portfolio on RapidAPI.

pub mod types;

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use zeroize::Zeroizing;

use crate::SignalSource;
use crate::error::BrokerError;
use crate::http;
use crate::types::{SignalSet, Symbol};
use types::SignalsResponse;

/// Neutral-portfolio endpoint.
pub const NEUTRAL_URL: &str = "https://market-signals1.p.rapidapi.com/v1/neutral/1/";
/// Host header expected by RapidAPI for the endpoint above.
pub const NEUTRAL_HOST: &str = "market-signals1.p.rapidapi.com";

/// Blocking client for the signal feed.
pub struct MarketSignals {
    client: Client,
    url: String,
    host: String,
    api_key: Zeroizing<String>,
}

impl MarketSignals {
    pub fn new(url: &str, host: &str, api_key: &str, timeout: Duration) -> Result<Self, BrokerError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            url: url.to_string(),
            host: host.to_string(),
            api_key: Zeroizing::new(api_key.to_string()),
        })
    }
}

impl SignalSource for MarketSignals {
    fn fetch_signals(&self) -> Result<SignalSet, BrokerError> {
        debug!("Fetching signals from {}", self.url);
        let resp = self
            .client
            .get(&self.url)
            .header("x-rapidapi-key", self.api_key.as_str())
            .header("x-rapidapi-host", self.host.as_str())
            .send()
            .map_err(|e| http::send_failed("signals", e))?;
        let body = http::success_body(resp, "signals")?;
        parse_signals(&body)
    }
}

/// Parse the signal payload. Missing lists, non-string entries and blank
/// symbols are all `MalformedResponse`.
pub fn parse_signals(body: &str) -> Result<SignalSet, BrokerError> {
    let resp: SignalsResponse = http::parse_json(body, "signals")?;
    Ok(SignalSet {
        long_symbols: to_symbols(&resp.long_positions, "long_positions")?,
        short_symbols: to_symbols(&resp.short_positions, "short_positions")?,
    })
}

fn to_symbols(raw: &[String], field: &str) -> Result<Vec<Symbol>, BrokerError> {
    raw.iter()
        .map(|s| {
            Symbol::try_new(s).ok_or_else(|| {
                BrokerError::MalformedResponse(format!("{field}: invalid symbol {s:?}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_lists_in_order() {
        let set = parse_signals(r#"{"long_positions": ["AAPL", "msft"], "short_positions": ["TSLA"]}"#)
            .unwrap();
        assert_eq!(set.long_symbols, vec![Symbol::new("AAPL"), Symbol::new("MSFT")]);
        assert_eq!(set.short_symbols, vec![Symbol::new("TSLA")]);
    }

    #[test]
    fn missing_short_list_is_malformed() {
        let err = parse_signals(r#"{"long_positions": ["AAPL"]}"#).unwrap_err();
        assert!(matches!(err, BrokerError::MalformedResponse(_)));
    }
}
