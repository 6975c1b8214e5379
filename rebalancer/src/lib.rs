//! signal-rebalancer: daily signal-driven portfolio rebalancer.
//!
//! Fetches a long/short target portfolio from a signal provider, closes
//! every open position at the brokerage, then opens one equally sized slot
//! per target symbol from freshly read equity.

pub mod audit;
pub mod broker;
pub mod config;
pub mod error;
pub mod execution;
pub mod rebalance;
pub mod sizing;
pub mod summary;
