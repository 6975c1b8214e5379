//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variables that may supply secrets left empty in the file.
pub const ENV_BROKER_KEY_ID: &str = "APCA_API_KEY_ID";
pub const ENV_BROKER_SECRET: &str = "APCA_API_SECRET_KEY";
pub const ENV_QUOTE_TOKEN: &str = "IEX_TOKEN";
pub const ENV_SIGNAL_KEY: &str = "RAPIDAPI_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub brokerage: BrokerageConfig,
    pub quotes: QuoteConfig,
    pub signals: SignalConfig,
    pub providers: ProviderConfig,
    pub sizing: SizingConfig,
    pub execution: ExecutionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerageConfig {
    #[serde(default = "default_broker_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key_id: String,
    #[serde(default)]
    pub api_secret_key: String,
}

impl Default for BrokerageConfig {
    fn default() -> Self {
        Self {
            base_url: default_broker_url(),
            api_key_id: String::new(),
            api_secret_key: String::new(),
        }
    }
}

fn default_broker_url() -> String {
    signal_broker::alpaca::PAPER_URL.into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteConfig {
    #[serde(default = "default_quote_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: String,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_quote_url(),
            token: String::new(),
        }
    }
}

fn default_quote_url() -> String {
    signal_broker::iex::CLOUD_URL.into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalConfig {
    #[serde(default = "default_signal_url")]
    pub url: String,
    #[serde(default = "default_signal_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: String,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            url: default_signal_url(),
            host: default_signal_host(),
            api_key: String::new(),
        }
    }
}

fn default_signal_url() -> String {
    signal_broker::rapidapi::NEUTRAL_URL.into()
}
fn default_signal_host() -> String {
    signal_broker::rapidapi::NEUTRAL_HOST.into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct SizingConfig {
    /// Fraction of equity deployed per side.
    #[serde(default = "default_leverage")]
    pub leverage: f64,
    /// Divisor splitting a side's capital, independent of list length.
    #[serde(default = "default_slots")]
    pub slots_per_side: u32,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            leverage: default_leverage(),
            slots_per_side: default_slots(),
        }
    }
}

fn default_leverage() -> f64 {
    0.9
}
fn default_slots() -> u32 {
    5
}

impl SizingConfig {
    /// Leverage as whole basis points (0.9 → 9000), rounded down so sizing
    /// never deploys more than configured. Float noise within a millionth of
    /// a basis point is absorbed first, so 0.29 stays 2900.
    pub fn leverage_bps(&self) -> u32 {
        (self.leverage * 10_000.0 + 1e-6).floor().clamp(0.0, 10_000.0) as u32
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_interval")]
    pub order_interval_ms: u64,
    /// 0 reads equity right after liquidation without waiting for fills.
    #[serde(default)]
    pub settle_timeout_secs: u64,
    #[serde(default = "default_settle_poll")]
    pub settle_poll_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            order_interval_ms: default_interval(),
            settle_timeout_secs: 0,
            settle_poll_ms: default_settle_poll(),
        }
    }
}

fn default_interval() -> u64 {
    100
}
fn default_settle_poll() -> u64 {
    1_000
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// JSONL audit trail. No trail is written when unset.
    #[serde(default)]
    pub audit_file: Option<PathBuf>,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Load `path` when it exists, otherwise validated defaults. Secrets then
    /// come from the environment.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        info!("{} not found; using defaults", path.display());
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Fill empty secrets from the environment (or any other lookup).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fill(&mut self.brokerage.api_key_id, lookup(ENV_BROKER_KEY_ID));
        fill(&mut self.brokerage.api_secret_key, lookup(ENV_BROKER_SECRET));
        fill(&mut self.quotes.token, lookup(ENV_QUOTE_TOKEN));
        fill(&mut self.signals.api_key, lookup(ENV_SIGNAL_KEY));
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        let lev = self.sizing.leverage;
        if !(lev > 0.0 && lev <= 1.0) {
            return Err(Error::Config("leverage must be in (0.0, 1.0]".into()));
        }
        if self.sizing.leverage_bps() == 0 {
            return Err(Error::Config(
                "leverage must be at least 0.0001 (one basis point)".into(),
            ));
        }
        if self.sizing.slots_per_side == 0 {
            return Err(Error::Config("slots_per_side must be >= 1".into()));
        }
        if self.providers.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be > 0".into()));
        }
        if self.execution.settle_timeout_secs > 0 && self.execution.settle_poll_ms == 0 {
            return Err(Error::Config(
                "settle_poll_ms must be > 0 when settle_timeout_secs is set".into(),
            ));
        }
        for (name, url) in [
            ("brokerage.base_url", &self.brokerage.base_url),
            ("quotes.base_url", &self.quotes.base_url),
            ("signals.url", &self.signals.url),
        ] {
            if url.trim().is_empty() {
                return Err(Error::Config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    /// Check that every provider secret is present.
    pub fn require_credentials(&self) -> Result<()> {
        for (name, value, env) in [
            ("brokerage.api_key_id", &self.brokerage.api_key_id, ENV_BROKER_KEY_ID),
            ("brokerage.api_secret_key", &self.brokerage.api_secret_key, ENV_BROKER_SECRET),
            ("quotes.token", &self.quotes.token, ENV_QUOTE_TOKEN),
            ("signals.api_key", &self.signals.api_key, ENV_SIGNAL_KEY),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!(
                    "{name} is empty; set it in the config file or via {env}"
                )));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.providers.timeout_secs)
    }
}

fn fill(slot: &mut String, value: Option<String>) {
    if slot.trim().is_empty() {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            *slot = v;
        }
    }
}
