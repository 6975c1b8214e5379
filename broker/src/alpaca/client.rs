//! Alpaca v2 REST API client.

use std::time::Duration;

use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use zeroize::Zeroizing;

use super::types::{AccountResponse, ErrorResponse, OrderRequest, OrderResponse, PositionResponse};
use crate::error::BrokerError;
use crate::http;

/// Blocking Alpaca REST client.
pub struct AlpacaClient {
    client: Client,
    base_url: String,
    key_id: Zeroizing<String>,
    secret_key: Zeroizing<String>,
}

impl AlpacaClient {
    /// Create a new client against `base_url` (paper or live endpoint).
    pub fn new(
        base_url: &str,
        key_id: &str,
        secret_key: &str,
        timeout: Duration,
    ) -> Result<Self, BrokerError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            key_id: Zeroizing::new(key_id.to_string()),
            secret_key: Zeroizing::new(secret_key.to_string()),
        })
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("APCA-API-KEY-ID", self.key_id.as_str())
            .header("APCA-API-SECRET-KEY", self.secret_key.as_str())
    }

    /// Get account information (GET /v2/account).
    pub fn account(&self) -> Result<AccountResponse, BrokerError> {
        let url = format!("{}/v2/account", self.base_url);
        let resp = self
            .authed(self.client.get(&url))
            .send()
            .map_err(|e| http::send_failed("account", e))?;
        let body = http::success_body(resp, "account")?;
        http::parse_json(&body, "account")
    }

    /// Get all open positions (GET /v2/positions).
    pub fn positions(&self) -> Result<Vec<PositionResponse>, BrokerError> {
        let url = format!("{}/v2/positions", self.base_url);
        let resp = self
            .authed(self.client.get(&url))
            .send()
            .map_err(|e| http::send_failed("positions", e))?;
        let body = http::success_body(resp, "positions")?;
        http::parse_json(&body, "positions")
    }

    /// Submit a new order (POST /v2/orders).
    ///
    /// 4xx answers are rejections; 5xx answers mean the brokerage is unavailable.
    pub fn submit_order(&self, order: &OrderRequest<'_>) -> Result<OrderResponse, BrokerError> {
        let url = format!("{}/v2/orders", self.base_url);

        debug!(
            "Submitting Alpaca order: {} {} {} {} {}",
            order.side, order.qty, order.symbol, order.order_type, order.time_in_force
        );

        let resp = self
            .authed(self.client.post(&url))
            .json(order)
            .send()
            .map_err(|e| http::send_failed("order", e))?;

        let (status, body) = http::read_body(resp, "order")?;
        classify_order_response(status, &body)?;
        http::parse_json(&body, "order acknowledgment")
    }
}

/// 2xx is accepted, 5xx leaves the brokerage unavailable, anything else is
/// a rejection of this order.
pub fn classify_order_response(status: StatusCode, body: &str) -> Result<(), BrokerError> {
    if status.is_success() {
        Ok(())
    } else if status.is_server_error() {
        Err(BrokerError::ProviderUnavailable(format!(
            "order returned {status}: {}",
            body.trim()
        )))
    } else {
        Err(BrokerError::OrderRejected(rejection_message(status.as_u16(), body)))
    }
}

/// Human-readable reason from an Alpaca error payload, falling back to the raw body.
pub fn rejection_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => match err.code {
            Some(code) => format!("{} (code {code}, HTTP {status})", err.message),
            None => format!("{} (HTTP {status})", err.message),
        },
        Err(_) => format!("HTTP {status}: {}", body.trim()),
    }
}
