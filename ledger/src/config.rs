//! Wallet configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use multisig_types::{AccountId, ValueTransfer};

use crate::{LedgerError, MultisigLedger};

/// Deployment parameters for a multisig wallet.
///
/// Can be loaded from a TOML file via [`WalletConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Owner account ids, `0x`-prefixed hex. Order is preserved.
    pub owners: Vec<String>,

    /// Confirmations needed before a proposal executes.
    pub required_confirmations: u32,

    /// Amount credited from the first owner when the wallet is initialised.
    #[serde(default)]
    pub initial_deposit: u64,

    /// Where the wallet snapshot is stored.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_state_file() -> PathBuf {
    PathBuf::from("./multisig.state")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl WalletConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, LedgerError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| LedgerError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, LedgerError> {
        toml::from_str(s).map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, LedgerError> {
        toml::to_string_pretty(self).map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Parse the configured owners.
    pub fn owner_ids(&self) -> Result<Vec<AccountId>, LedgerError> {
        self.owners
            .iter()
            .map(|raw| {
                raw.parse::<AccountId>()
                    .map_err(|e| LedgerError::InvalidConfig(e.to_string()))
            })
            .collect()
    }

    /// Construct an empty ledger from this configuration.
    ///
    /// `initial_deposit` is not applied here; callers decide who pays it in.
    pub fn build_ledger<T: ValueTransfer>(
        &self,
        transfer: T,
    ) -> Result<MultisigLedger<T>, LedgerError> {
        MultisigLedger::new(self.owner_ids()?, self.required_confirmations, transfer)
    }
}
