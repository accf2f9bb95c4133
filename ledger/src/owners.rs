//! The immutable owner registry.

use std::collections::HashSet;

use multisig_types::AccountId;

use crate::error::LedgerError;

/// Owners fixed at construction, in construction order.
#[derive(Clone, Debug)]
pub struct OwnerSet {
    ordered: Vec<AccountId>,
    members: HashSet<AccountId>,
}

impl OwnerSet {
    /// Build an owner set, rejecting empty or duplicated input.
    pub fn new(owners: Vec<AccountId>) -> Result<Self, LedgerError> {
        if owners.is_empty() {
            return Err(LedgerError::InvalidConfig("owner set is empty".into()));
        }
        let mut members = HashSet::with_capacity(owners.len());
        for owner in &owners {
            if !members.insert(*owner) {
                return Err(LedgerError::InvalidConfig(format!(
                    "duplicate owner {owner}"
                )));
            }
        }
        Ok(Self {
            ordered: owners,
            members,
        })
    }

    pub fn is_owner(&self, address: &AccountId) -> bool {
        self.members.contains(address)
    }

    pub fn as_slice(&self) -> &[AccountId] {
        &self.ordered
    }

    /// Never zero; construction rejects an empty set.
    pub(crate) fn len(&self) -> usize {
        self.ordered.len()
    }
}
