//! RapidAPI "market signals" response types.

use serde::Deserialize;

/// Latest neutral portfolio. Both lists are required.
#[derive(Debug, Deserialize)]
pub struct SignalsResponse {
    pub long_positions: Vec<String>,
    pub short_positions: Vec<String>,
}
