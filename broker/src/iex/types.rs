//! IEX Cloud response types.

use serde::Deserialize;

/// One entry of the `tops` endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopsEntry {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub last_sale_price: Option<f64>,
    #[serde(default)]
    pub last_sale_size: Option<u64>,
}
