//! Alpaca-specific API request and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Alpaca account response (`GET /v2/account`). Amounts arrive as strings.
#[derive(Debug, Deserialize)]
pub struct AccountResponse {
    #[serde(default)]
    pub equity: Option<Value>,
    #[serde(default)]
    pub cash: Option<Value>,
    #[serde(default)]
    pub buying_power: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
}

/// One entry of `GET /v2/positions`.
#[derive(Debug, Deserialize)]
pub struct PositionResponse {
    pub symbol: String,
    #[serde(default)]
    pub side: String,
    pub qty: Value,
}

/// Body of `POST /v2/orders`.
#[derive(Debug, Serialize)]
pub struct OrderRequest<'a> {
    pub symbol: &'a str,
    pub qty: u64,
    pub side: &'a str,
    #[serde(rename = "type")]
    pub order_type: &'a str,
    pub time_in_force: &'a str,
}

/// Alpaca order acknowledgment.
#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Alpaca error payload.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub code: Option<Value>,
    pub message: String,
}
