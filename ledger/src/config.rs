//! Ledger configuration with TOML file support.

use multidelegate_types::{Address, Salt};
use multidelegate_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::LedgerError;

/// Configuration for a multi-delegate ledger.
///
/// Can be loaded from a TOML file via [`MultiDelegateConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiDelegateConfig {
    /// The ledger's own account: proxy factory and spender of every transfer.
    #[serde(default = "default_system_address")]
    pub system_address: Address,

    /// Salt mixed into every proxy address.
    #[serde(default)]
    pub salt: Salt,

    /// Metadata URI template; `{id}` is replaced by the accounting-token id.
    #[serde(default = "default_uri")]
    pub uri: String,

    /// The only account allowed to change `uri`. Zero means nobody.
    #[serde(default)]
    pub owner: Address,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_system_address() -> Address {
    Address::new([0x4d; 20])
}

fn default_uri() -> String {
    "http://localhost:8080/{id}".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl MultiDelegateConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| LedgerError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, LedgerError> {
        let config: Self = toml::from_str(s).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, LedgerError> {
        toml::to_string_pretty(self).map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Install the global tracing subscriber described by `log_format` and
    /// `log_level`. Returns `false` if one was already installed.
    pub fn init_logging(&self) -> bool {
        multidelegate_utils::init_logging(self.log_format, &self.log_level)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.system_address.is_zero() {
            return Err(LedgerError::Config("system_address must not be zero".into()));
        }
        Ok(())
    }
}

impl Default for MultiDelegateConfig {
    fn default() -> Self {
        Self {
            system_address: default_system_address(),
            salt: Salt::ZERO,
            uri: default_uri(),
            owner: Address::ZERO,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
