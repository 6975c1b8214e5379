//! Blocking HTTP plumbing shared by the REST providers.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::BrokerError;
use crate::types::dollars_to_cents;

/// Build a blocking client with an explicit per-call timeout.
pub(crate) fn build_client(timeout: Duration) -> Result<Client, BrokerError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BrokerError::ProviderUnavailable(format!("failed to build HTTP client: {e}")))
}

/// Transport failures (including timeouts) make the provider unavailable.
pub(crate) fn send_failed(what: &str, e: reqwest::Error) -> BrokerError {
    if e.is_timeout() {
        BrokerError::ProviderUnavailable(format!("{what} timed out"))
    } else {
        BrokerError::ProviderUnavailable(format!("{what} request failed: {e}"))
    }
}

/// Read the full body together with its status.
pub(crate) fn read_body(resp: Response, what: &str) -> Result<(StatusCode, String), BrokerError> {
    let status = resp.status();
    let body = resp
        .text()
        .map_err(|e| BrokerError::ProviderUnavailable(format!("{what}: failed to read body: {e}")))?;
    Ok((status, body))
}

/// A read that does not answer 2xx leaves the provider unavailable.
pub fn classify_read_response(status: StatusCode, body: &str, what: &str) -> Result<(), BrokerError> {
    if status.is_success() {
        return Ok(());
    }
    Err(BrokerError::ProviderUnavailable(format!(
        "{what} returned {status}: {}",
        body.trim()
    )))
}

/// Body of a 2xx response; anything else is `ProviderUnavailable`.
pub(crate) fn success_body(resp: Response, what: &str) -> Result<String, BrokerError> {
    let (status, body) = read_body(resp, what)?;
    classify_read_response(status, &body, what)?;
    Ok(body)
}

/// Decode a JSON body, mapping schema violations to `MalformedResponse`.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, BrokerError> {
    serde_json::from_str(body)
        .map_err(|e| BrokerError::MalformedResponse(format!("{what}: {e}")))
}

/// A decimal sent either as a JSON number or as a numeric string.
pub(crate) fn decimal(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// A dollar amount (number or numeric string) in cents.
pub(crate) fn decimal_cents(value: &Value) -> Option<i64> {
    decimal(value).and_then(dollars_to_cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decimal_accepts_numbers_and_strings() {
        assert_eq!(decimal(&json!(12.5)), Some(12.5));
        assert_eq!(decimal(&json!("12.5")), Some(12.5));
        assert_eq!(decimal(&json!(" -3 ")), Some(-3.0));
        assert_eq!(decimal(&json!("abc")), None);
        assert_eq!(decimal(&json!(null)), None);
        assert_eq!(decimal(&json!([1])), None);
    }

    #[test]
    fn decimal_cents_rounds() {
        assert_eq!(decimal_cents(&json!("100000.00")), Some(100_000_00));
        assert_eq!(decimal_cents(&json!(180)), Some(180_00));
    }

    #[test]
    fn non_success_read_is_unavailable() {
        assert!(classify_read_response(StatusCode::OK, "[]", "positions").is_ok());
        for status in [StatusCode::UNAUTHORIZED, StatusCode::NOT_FOUND, StatusCode::BAD_GATEWAY] {
            assert!(matches!(
                classify_read_response(status, "nope", "positions"),
                Err(BrokerError::ProviderUnavailable(_))
            ));
        }
    }

    #[test]
    fn parse_json_maps_to_malformed() {
        let err = parse_json::<Vec<String>>("{}", "thing").unwrap_err();
        assert!(matches!(err, BrokerError::MalformedResponse(_)));
    }
}
