//! Payout journal — the CLI's value-transfer mechanism.
//!
//! An executed proposal is released by appending one JSON line to the
//! journal file. Whatever settles payouts reads the journal; the wallet only
//! guarantees each executed index appears exactly once.
//!
//! The journal is written before the wallet snapshot. If saving the snapshot
//! fails, the record stays pending and the owner retries; a release for an
//! index already in the journal is then acknowledged without a second line.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use multisig_types::{OutboundTransfer, TransferError, ValueTransfer};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One released payout, as stored in the journal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub index: u64,
    pub target: String,
    /// Decimal string; JSON numbers cannot carry the full u128 range.
    pub value: String,
    /// Hex-encoded call data.
    pub payload: String,
}

impl From<&OutboundTransfer> for JournalEntry {
    fn from(outbound: &OutboundTransfer) -> Self {
        Self {
            index: outbound.index,
            target: outbound.target.to_string(),
            value: outbound.value.to_string(),
            payload: hex::encode(&outbound.payload),
        }
    }
}

pub struct JournalTransfer {
    path: PathBuf,
}

impl JournalTransfer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn already_released(&self, index: u64) -> Result<bool, TransferError> {
        let entries = read_journal(&self.path)
            .map_err(|e| TransferError::Other(format!("{}: {e:#}", self.path.display())))?;
        Ok(entries.iter().any(|entry| entry.index == index))
    }
}

impl ValueTransfer for JournalTransfer {
    fn transfer(&mut self, outbound: &OutboundTransfer) -> Result<(), TransferError> {
        if self.already_released(outbound.index)? {
            info!(
                index = outbound.index,
                journal = %self.path.display(),
                "payout already journaled"
            );
            return Ok(());
        }

        let mut line = serde_json::to_string(&JournalEntry::from(outbound))
            .map_err(|e| TransferError::Other(e.to_string()))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| TransferError::Other(format!("{}: {e}", self.path.display())))?;
        file.write_all(line.as_bytes())
            .map_err(|e| TransferError::Other(format!("{}: {e}", self.path.display())))?;

        info!(
            index = outbound.index,
            target = %outbound.target,
            value = %outbound.value,
            journal = %self.path.display(),
            "payout released"
        );
        Ok(())
    }
}

/// Read every entry from a journal. A missing journal is empty.
pub fn read_journal(path: &Path) -> anyhow::Result<Vec<JournalEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    fs::read_to_string(path)?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}
