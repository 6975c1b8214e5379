//! IEX Cloud last-sale quotes.

pub mod types;

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use zeroize::Zeroizing;

use crate::QuoteSource;
use crate::error::BrokerError;
use crate::http;
use crate::types::{Price, Symbol};
use types::TopsEntry;

/// Production endpoint.
pub const CLOUD_URL: &str = "https://cloud.iexapis.com";

/// Blocking IEX Cloud quote client.
pub struct IexQuotes {
    client: Client,
    base_url: String,
    token: Zeroizing<String>,
}

impl IexQuotes {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, BrokerError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Zeroizing::new(token.to_string()),
        })
    }

    /// Fetch `tops` for a comma-separated symbol list (GET /stable/tops).
    fn tops(&self, symbols: &[Symbol]) -> Result<Vec<TopsEntry>, BrokerError> {
        let joined = symbols
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/stable/tops", self.base_url);

        debug!("Fetching IEX tops for {joined}");

        let resp = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str()), ("symbols", joined.as_str())])
            .send()
            .map_err(|e| http::send_failed("quote", e))?;
        let body = http::success_body(resp, "quote")?;
        http::parse_json(&body, "quote")
    }
}

impl QuoteSource for IexQuotes {
    fn last_price(&self, symbol: &Symbol) -> Result<Price, BrokerError> {
        let entries = self
            .tops(std::slice::from_ref(symbol))
            .map_err(|e| unavailable(symbol, e))?;
        match_prices(std::slice::from_ref(symbol), &entries)
            .pop()
            .unwrap_or_else(|| Err(BrokerError::QuoteUnavailable(symbol.to_string())))
    }

    /// One request for the whole batch. If the batch request itself fails,
    /// each symbol falls back to its own lookup.
    fn last_prices(&self, symbols: &[Symbol]) -> Vec<Result<Price, BrokerError>> {
        if symbols.is_empty() {
            return Vec::new();
        }
        match self.tops(symbols) {
            Ok(entries) => match_prices(symbols, &entries),
            Err(e) => {
                debug!("batched quote request failed ({e}); falling back to single lookups");
                symbols.iter().map(|s| self.last_price(s)).collect()
            }
        }
    }
}

fn unavailable(symbol: &Symbol, e: BrokerError) -> BrokerError {
    BrokerError::QuoteUnavailable(format!("{symbol}: {e}"))
}

/// Pair each requested symbol with its entry: by the entry's `symbol` field
/// when present, otherwise by request order.
pub fn match_prices(symbols: &[Symbol], entries: &[TopsEntry]) -> Vec<Result<Price, BrokerError>> {
    symbols
        .iter()
        .enumerate()
        .map(|(i, sym)| {
            let entry = entries
                .iter()
                .find(|e| {
                    e.symbol
                        .as_deref()
                        .is_some_and(|s| s.eq_ignore_ascii_case(sym.as_str()))
                })
                .or_else(|| entries.get(i).filter(|e| e.symbol.is_none()));

            entry
                .and_then(|e| e.last_sale_price)
                .and_then(Price::from_dollars)
                .ok_or_else(|| BrokerError::QuoteUnavailable(sym.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(json: &str) -> Vec<TopsEntry> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn single_symbol_price() {
        let e = entries(r#"[{"symbol": "AAPL", "lastSalePrice": 180.0}]"#);
        let prices = match_prices(&[Symbol::new("AAPL")], &e);
        assert_eq!(prices, vec![Ok(Price::from_cents(180_00))]);
    }

    #[test]
    fn empty_response_is_unavailable() {
        let prices = match_prices(&[Symbol::new("ZZZZ")], &[]);
        assert!(matches!(prices[0], Err(BrokerError::QuoteUnavailable(_))));
    }

    #[test]
    fn sub_cent_prices_survive() {
        let e = entries(
            r#"[{"symbol": "AAPL", "lastSalePrice": 180.004},
                {"symbol": "PENNY", "lastSalePrice": 0.004}]"#,
        );
        let prices = match_prices(&[Symbol::new("AAPL"), Symbol::new("PENNY")], &e);
        assert_eq!(prices, vec![Ok(Price(180_004_000)), Ok(Price(4_000))]);
    }

    #[test]
    fn zero_price_is_unavailable() {
        let e = entries(r#"[{"symbol": "AAPL", "lastSalePrice": 0}]"#);
        let prices = match_prices(&[Symbol::new("AAPL")], &e);
        assert!(prices[0].is_err());
    }
}
