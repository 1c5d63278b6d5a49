//! Environment-driven configuration.
//!
//! Every required value is checked once at startup, before any network
//! activity; a missing or malformed variable aborts the process with an
//! error naming the offending field.

use std::time::Duration;

use alloy::primitives::Address;
use thiserror::Error;

/// How far back the historical scan looks for `Loaned` events.
pub const HISTORY_WINDOW_BLOCKS: u64 = 1000;

/// Environment variable names.
pub mod env {
    pub const WALLET_PRIVATE_KEY: &str = "WALLET_PRIVATE_KEY";
    pub const JSON_RPC_URL: &str = "JSON_RPC_URL";
    pub const LIQUIDATION_POLLING_TIME_IN_MS: &str = "LIQUIDATION_POLLING_TIME_IN_MS";
    pub const CONTRACT_ADDRESS: &str = "CONTRACT_ADDRESS";
}

/// Configuration error raised during startup validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable must be defined")]
    Missing(&'static str),
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Validated runtime settings, immutable after startup.
#[derive(Clone)]
pub struct Settings {
    /// Private key of the wallet that signs liquidation transactions
    pub private_key: String,
    /// JSON-RPC endpoint URL
    pub rpc_url: String,
    /// Target lending pool contract
    pub contract_address: Address,
    /// Interval between liquidation sweeps
    pub polling_interval: Duration,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| -> Result<String, ConfigError> {
            match lookup(name) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => Err(ConfigError::Missing(name)),
            }
        };

        let private_key = require(env::WALLET_PRIVATE_KEY)?;
        let rpc_url = require(env::JSON_RPC_URL)?;

        let contract_address: Address = require(env::CONTRACT_ADDRESS)?
            .parse()
            .map_err(|e| ConfigError::Invalid(env::CONTRACT_ADDRESS, format!("{e}")))?;

        let polling_ms: u64 = require(env::LIQUIDATION_POLLING_TIME_IN_MS)?
            .trim()
            .parse()
            .map_err(|e| ConfigError::Invalid(env::LIQUIDATION_POLLING_TIME_IN_MS, format!("{e}")))?;
        if polling_ms == 0 {
            return Err(ConfigError::Invalid(
                env::LIQUIDATION_POLLING_TIME_IN_MS,
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            private_key,
            rpc_url,
            contract_address,
            polling_interval: Duration::from_millis(polling_ms),
        })
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("private_key", &"<redacted>")
            .field("rpc_url", &self.rpc_url)
            .field("contract_address", &self.contract_address)
            .field("polling_interval", &self.polling_interval)
            .finish()
    }
}
