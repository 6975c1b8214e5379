//! Error types for the rebalancer.

use std::path::PathBuf;

use signal_broker::BrokerError;

/// All errors that can end a rebalancer command.
///
/// Per-order failures are not errors at this level; they are collected in
/// the run summary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Signals or positions could not be read; no order was attempted.
    #[error("snapshot failed ({stage}): {source}")]
    Snapshot {
        stage: &'static str,
        source: BrokerError,
    },

    #[error("provider error: {0}")]
    Provider(#[from] BrokerError),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

impl Error {
    /// The snapshot could not be taken, so nothing was traded.
    pub fn is_pre_trade_abort(&self) -> bool {
        matches!(self, Error::Snapshot { .. })
    }

    /// Process exit code for a command that ended with this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_pre_trade_abort() { 2 } else { 1 }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
