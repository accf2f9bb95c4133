//! Ledger snapshots: capture the full wallet state for persistence.
//!
//! A snapshot holds the owner set, threshold, balance and every transaction
//! record. Its hash is computed deterministically from that content so a
//! reader can detect corruption or tampering before trusting it. The event
//! log is not part of a snapshot.

use std::fs;
use std::path::Path;

use multisig_types::{AccountId, Amount};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::transaction::Transaction;

/// A persisted capture of a [`MultisigLedger`](crate::MultisigLedger).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Blake2b-256 over the snapshot content.
    pub hash: [u8; 32],
    /// Snapshot format version.
    pub version: u32,
    pub owners: Vec<AccountId>,
    pub required_confirmations: u32,
    pub balance: Amount,
    /// All records in creation order.
    pub transactions: Vec<Transaction>,
}

impl LedgerSnapshot {
    pub const VERSION: u32 = 1;

    pub fn create(
        owners: Vec<AccountId>,
        required_confirmations: u32,
        balance: Amount,
        transactions: Vec<Transaction>,
    ) -> Self {
        let mut snap = Self {
            hash: [0u8; 32],
            version: Self::VERSION,
            owners,
            required_confirmations,
            balance,
            transactions,
        };
        snap.hash = snap.compute_hash();
        snap
    }

    fn compute_hash(&self) -> [u8; 32] {
        use blake2::digest::consts::U32;
        use blake2::{Blake2b, Digest};

        let mut hasher = Blake2b::<U32>::new();
        hasher.update(self.version.to_le_bytes());
        hasher.update((self.owners.len() as u64).to_le_bytes());
        for owner in &self.owners {
            hasher.update(owner.as_bytes());
        }
        hasher.update(self.required_confirmations.to_le_bytes());
        hasher.update(self.balance.raw().to_le_bytes());
        hasher.update((self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            hasher.update(tx.proposer.as_bytes());
            hasher.update(tx.target.as_bytes());
            hasher.update(tx.value.raw().to_le_bytes());
            hasher.update((tx.payload.len() as u64).to_le_bytes());
            hasher.update(&tx.payload);
            hasher.update(tx.confirmations.to_le_bytes());
            hasher.update(tx.rejections.to_le_bytes());
            hasher.update([u8::from(tx.executed), u8::from(tx.rejected)]);
            hasher.update((tx.voters.len() as u64).to_le_bytes());
            for voter in tx.voters() {
                hasher.update(voter.as_bytes());
            }
        }

        let result = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&result);
        out
    }

    /// Verify the snapshot hash matches its content.
    pub fn verify(&self) -> bool {
        self.hash == self.compute_hash()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        bincode::serialize(self).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        bincode::deserialize(bytes).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    /// Write the snapshot to `path`, replacing any previous file atomically.
    pub fn write_to(&self, path: &Path) -> Result<(), LedgerError> {
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Read a snapshot from `path`. Does not verify it; see [`verify`](Self::verify).
    pub fn read_from(path: &Path) -> Result<Self, LedgerError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}
